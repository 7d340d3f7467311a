//! Desktop integration: background picture and file browser.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{Result, WikiwallError};

const OSASCRIPT: &str = "/usr/bin/osascript";

/// AppleScript that sets `image` as the picture of every desktop.
pub fn set_wallpaper_script(image: &Path) -> String {
    let escaped = image
        .display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!(
        r#"tell application "System Events"
    tell every desktop
        set picture to "{escaped}"
    end tell
end tell"#
    )
}

/// Run an AppleScript, surfacing its stderr on failure.
pub fn run_applescript(script: &str) -> Result<()> {
    let mut child = Command::new(OSASCRIPT)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| WikiwallError::Wallpaper(format!("Failed to run {OSASCRIPT}: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(script.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(WikiwallError::Wallpaper(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    debug!("AppleScript completed");
    Ok(())
}

/// Set `image` as the desktop background.
pub fn set_wallpaper(image: &Path) -> Result<()> {
    run_applescript(&set_wallpaper_script(image))?;
    info!(path = %image.display(), "Desktop background set");
    Ok(())
}

/// Sets the desktop background picture.
pub trait DesktopBackground: Send + Sync {
    fn set_background(&self, image: &Path) -> Result<()>;
}

/// [`DesktopBackground`] for macOS through System Events.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppleScriptBackground;

impl DesktopBackground for AppleScriptBackground {
    fn set_background(&self, image: &Path) -> Result<()> {
        set_wallpaper(image)
    }
}

/// Command that opens a directory in the platform file browser.
pub fn reveal_command(dir: &Path) -> Command {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    let mut command = Command::new(opener);
    command.arg(dir);
    command
}

/// Open `dir` in the platform file browser.
pub fn reveal(dir: &Path) -> Result<()> {
    let status = reveal_command(dir)
        .status()
        .map_err(|e| WikiwallError::Wallpaper(format!("Failed to open file browser: {e}")))?;

    if !status.success() {
        return Err(WikiwallError::Wallpaper(format!(
            "File browser exited with {status}"
        )));
    }
    Ok(())
}
