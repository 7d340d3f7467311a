//! Common utility functions shared across CLI commands.

use std::io::Write;

/// Render a byte count as a short human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MB", b / MIB)
    } else if b >= KIB {
        format!("{:.0} KB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// One progress line, e.g. `Downloading monet.jpg  42% (1.2 MB / 2.9 MB)`.
pub fn format_progress(name: &str, done: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let percent = (done.min(total) * 100) / total;
            format!(
                "Downloading {name} {percent:>3}% ({} / {})",
                format_bytes(done),
                format_bytes(total)
            )
        }
        _ => format!("Downloading {name} {}", format_bytes(done)),
    }
}

/// Redraws a single progress line on stderr.
pub struct ProgressLine {
    quiet: bool,
    drawn: bool,
}

impl ProgressLine {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            drawn: false,
        }
    }

    pub fn update(&mut self, name: &str, done: u64, total: Option<u64>) {
        if self.quiet {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", format_progress(name, done, total));
        let _ = stderr.flush();
        self.drawn = true;
    }

    pub fn finish(&mut self) {
        if self.drawn {
            eprintln!();
            self.drawn = false;
        }
    }
}
