use anyhow::Result;

use super::{EventSender, WindowWatcher};

/// A no-op watcher that forwards nothing.
///
/// Used as a fallback when no supported display server is detected, so the
/// daemon keeps running instead of crash-looping under a session manager.
pub struct NoopWatcher;

impl WindowWatcher for NoopWatcher {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn watch(&mut self, _events: &EventSender) -> Result<()> {
        // nothing to observe; park until the process exits
        loop {
            std::thread::park();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_watcher_has_a_name() {
        assert_eq!(NoopWatcher.name(), "noop");
    }
}
