use crossterm::terminal;
use log::warn;

/// Keeps the terminal in raw mode while alive, restores it on drop.
///
/// Dropping it on every exit path, including errors and user interrupts, returns the
/// terminal to its original configuration.
pub struct RawLock {
    enabled: bool,
}

impl Drop for RawLock {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Error resetting terminal {e}");
        }
    }
}

/// Set terminal to raw in best-effort mode, only log on failure, e.g. when not attached to a
/// terminal.
#[must_use]
pub fn set_terminal_raw() -> RawLock {
    match terminal::enable_raw_mode() {
        Ok(()) => RawLock { enabled: true },
        Err(e) => {
            warn!("Could not set terminal to raw mode: {e}");
            RawLock { enabled: false }
        }
    }
}
