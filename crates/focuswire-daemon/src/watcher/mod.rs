//! Active-window watchers: responsibility and boundaries
//!
//! A watcher is responsible ONLY for observing the host environment's
//! activation signal and turning it into WindowEvent(s). It decides nothing
//! about the forwarding shape; projection and the bus call belong to the
//! forwarder.

mod noop;
#[cfg(target_os = "linux")]
mod wayland;
#[cfg(target_os = "linux")]
mod x11;

pub use noop::NoopWatcher;
#[cfg(target_os = "linux")]
pub use wayland::WaylandWindowWatcher;
#[cfg(target_os = "linux")]
pub use x11::X11WindowWatcher;

use anyhow::Result;
use focuswire_core::{Backend, WindowEvent};
use tokio::sync::mpsc;

pub type EventSender = mpsc::Sender<WindowEvent>;

pub trait WindowWatcher: Send {
    fn name(&self) -> &'static str;

    /// Block the current thread observing the host's activation signal and
    /// send one event per activation. Returns when the event channel closes
    /// or the host connection is lost.
    fn watch(&mut self, events: &EventSender) -> Result<()>;
}

/// Create the watcher for the configured backend.
///
/// `auto` probes Wayland first, then X11, then falls back to the no-op
/// watcher. An explicitly requested backend that is unavailable also falls
/// back to no-op, with a warning, so the daemon stays up.
#[cfg(target_os = "linux")]
pub fn create_watcher(backend: Backend) -> Box<dyn WindowWatcher> {
    use tracing::warn;

    match backend {
        Backend::Auto => detect_watcher(),
        Backend::Wayland => match WaylandWindowWatcher::new() {
            Some(watcher) => Box::new(watcher),
            None => {
                warn!("wayland watcher unavailable, window events disabled");
                Box::new(NoopWatcher)
            }
        },
        Backend::X11 => match X11WindowWatcher::new() {
            Some(watcher) => Box::new(watcher),
            None => {
                warn!("x11 watcher unavailable, window events disabled");
                Box::new(NoopWatcher)
            }
        },
        Backend::None => Box::new(NoopWatcher),
    }
}

#[cfg(not(target_os = "linux"))]
pub fn create_watcher(_backend: Backend) -> Box<dyn WindowWatcher> {
    tracing::info!("window watching is only supported on Linux");
    Box::new(NoopWatcher)
}

#[cfg(target_os = "linux")]
fn detect_watcher() -> Box<dyn WindowWatcher> {
    use tracing::{info, warn};

    if let Some(watcher) = WaylandWindowWatcher::new() {
        info!("detected Wayland session with foreign toplevel support");
        return Box::new(watcher);
    }

    if let Some(watcher) = X11WindowWatcher::new() {
        info!("detected X11 session");
        return Box::new(watcher);
    }

    warn!("no supported display server detected, window events disabled");
    Box::new(NoopWatcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_watcher_always_returns_a_watcher() {
        for backend in [Backend::Auto, Backend::Wayland, Backend::X11, Backend::None] {
            let watcher = create_watcher(backend);
            assert!(!watcher.name().is_empty());
        }
    }

    #[test]
    fn backend_none_selects_the_noop_watcher() {
        let watcher = create_watcher(Backend::None);

        assert_eq!(watcher.name(), "noop");
    }
}
