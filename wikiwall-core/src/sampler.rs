//! Single-pass uniform sampling from sequences of unknown length.
//!
//! Implements reservoir sampling (Algorithm R). The source is consumed exactly
//! once, front to back, and at most `k` items are held in memory at any time,
//! so scraped candidate lists never need to be collected up front.

use rand::Rng;
use tracing::warn;

/// Result of a reservoir pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample<T> {
    items: Vec<T>,
    requested: usize,
    seen: usize,
}

impl<T> Sample<T> {
    /// Sampled items, at most `requested` of them.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Number of items the source produced.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// True when the source ran dry before `k` items were collected.
    pub fn is_short(&self) -> bool {
        self.items.len() < self.requested
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Draw a uniform random sample of up to `k` items from `source`.
///
/// Every item produced by the source ends up in the result with probability
/// `k / n`. If the source yields fewer than `k` items, all of them are
/// returned and a single warning is logged.
pub fn sample<I, R>(source: I, k: usize, rng: &mut R) -> Sample<I::Item>
where
    I: IntoIterator,
    R: Rng + ?Sized,
{
    if k == 0 {
        return Sample {
            items: Vec::new(),
            requested: 0,
            seen: 0,
        };
    }

    let mut reservoir = Vec::with_capacity(k);
    let mut seen = 0usize;

    for (i, item) in source.into_iter().enumerate() {
        if i < k {
            reservoir.push(item);
        } else {
            let slot = rng.gen_range(0..=i);
            if slot < k {
                reservoir[slot] = item;
            }
        }
        seen = i + 1;
    }

    if reservoir.len() < k {
        warn!(
            size = reservoir.len(),
            k, "Size of source is less than requested sample size"
        );
    }

    Sample {
        items: reservoir,
        requested: k,
        seen,
    }
}

/// Pick one item uniformly at random using the thread-local generator.
pub fn sample_one<I>(source: I) -> Option<I::Item>
where
    I: IntoIterator,
{
    sample(source, 1, &mut rand::thread_rng())
        .into_items()
        .pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts WARN events seen on the current thread.
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_warnings(f: impl FnOnce()) -> usize {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        tracing::subscriber::with_default(subscriber, f);
        warnings.load(Ordering::SeqCst)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5EED)
    }

    #[test]
    fn test_returns_k_items_from_source() {
        let values = ["a", "b", "c", "d", "e", "f"];
        let result = sample(values, 4, &mut rng());

        assert_eq!(result.len(), 4);
        assert!(!result.is_short());
        for item in result.items() {
            assert!(values.contains(item));
        }
    }

    #[test]
    fn test_no_item_selected_twice() {
        let values: Vec<u32> = (0..50).collect();
        let mut items = sample(values, 20, &mut rng()).into_items();
        items.sort_unstable();
        items.dedup();
        assert_eq!(items.len(), 20);
    }

    #[test]
    fn test_short_source_returns_everything() {
        let values = vec!["a", "b", "c", "d", "e", "f"];
        let result = sample(values.clone(), 10, &mut rng());

        assert!(result.is_short());
        assert_eq!(result.seen(), 6);
        let mut items = result.into_items();
        items.sort_unstable();
        assert_eq!(items, values);
    }

    #[test]
    fn test_zero_k_is_empty_and_not_short() {
        let result = sample(1..100, 0, &mut rng());
        assert!(result.is_empty());
        assert!(!result.is_short());
    }

    #[test]
    fn test_empty_source() {
        let result = sample(std::iter::empty::<u8>(), 1, &mut rng());
        assert!(result.is_empty());
        assert!(result.is_short());
        assert_eq!(sample_one(std::iter::empty::<u8>()), None);
    }

    #[test]
    fn test_short_source_warns_exactly_once() {
        let warnings = count_warnings(|| {
            let result = sample(vec![1, 2, 3], 10, &mut rng());
            assert_eq!(result.len(), 3);
        });
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_no_warning_when_source_suffices() {
        let warnings = count_warnings(|| {
            sample(vec![1, 2, 3], 0, &mut rng());
            sample(vec![1, 2, 3], 2, &mut rng());
            sample(vec![1, 2, 3], 3, &mut rng());
        });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_consumes_lazy_source_once() {
        let mut pulled = 0;
        let source = (0..1000).inspect(|_| pulled += 1);
        let result = sample(source, 3, &mut rng());
        assert_eq!(result.seen(), 1000);
        drop(result);
        assert_eq!(pulled, 1000);
    }

    #[test]
    fn test_single_item_selection_is_uniform() {
        let n = 5;
        let trials = 50_000;
        let mut counts = vec![0usize; n];
        let mut rng = rng();

        for _ in 0..trials {
            let picked = sample(0..n, 1, &mut rng).into_items();
            counts[picked[0]] += 1;
        }

        let expected = trials as f64 / n as f64;
        for (value, count) in counts.iter().enumerate() {
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.05,
                "value {value} picked {count} times, expected ~{expected}"
            );
        }
    }
}
