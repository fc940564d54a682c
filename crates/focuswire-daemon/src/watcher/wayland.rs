use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::{debug, warn};
use wayland_client::{
    event_created_child,
    globals::{registry_queue_init, GlobalList, GlobalListContents},
    protocol::wl_registry,
    Connection, Dispatch, EventQueue, Proxy, QueueHandle,
};
use wayland_protocols_wlr::foreign_toplevel::v1::client::{
    zwlr_foreign_toplevel_handle_v1::{self, ZwlrForeignToplevelHandleV1},
    zwlr_foreign_toplevel_manager_v1::{self, ZwlrForeignToplevelManagerV1},
};

use focuswire_core::WindowEvent;

use super::{EventSender, WindowWatcher};

pub struct WaylandWindowWatcher {
    globals: GlobalList,
    queue: EventQueue<Tracker>,
}

impl WaylandWindowWatcher {
    pub fn new() -> Option<Self> {
        let connection = Connection::connect_to_env()
            .map_err(|error| {
                warn!(%error, "failed to connect to Wayland display");
            })
            .ok()?;

        let (globals, queue) = registry_queue_init::<Tracker>(&connection)
            .map_err(|error| {
                warn!(%error, "failed to read the Wayland registry");
            })
            .ok()?;

        let manager_available = globals
            .contents()
            .clone_list()
            .iter()
            .any(|global| global.interface == ZwlrForeignToplevelManagerV1::interface().name);

        if !manager_available {
            debug!("compositor does not expose foreign toplevel management");
            return None;
        }

        debug!("Wayland window watcher initialized");

        Some(Self { globals, queue })
    }
}

impl WindowWatcher for WaylandWindowWatcher {
    fn name(&self) -> &'static str {
        "wayland"
    }

    fn watch(&mut self, events: &EventSender) -> Result<()> {
        let queue_handle = self.queue.handle();
        let _manager: ZwlrForeignToplevelManagerV1 =
            self.globals.bind(&queue_handle, 1..=3, ())?;

        let mut tracker = Tracker {
            events: events.clone(),
            toplevels: HashMap::new(),
            finished: false,
            channel_closed: false,
        };

        loop {
            self.queue.blocking_dispatch(&mut tracker)?;

            if tracker.channel_closed {
                debug!("event channel closed, stopping Wayland watcher");
                return Ok(());
            }
            if tracker.finished {
                bail!("compositor finished the foreign toplevel protocol");
            }
        }
    }
}

/// Per-toplevel state. Property events accumulate in the pending slots and
/// are committed atomically on `done`, as the protocol requires.
#[derive(Default)]
struct Toplevel {
    app_id: String,
    title: String,
    activated: bool,
    pending_app_id: Option<String>,
    pending_title: Option<String>,
    pending_activated: Option<bool>,
}

struct Tracker {
    events: EventSender,
    toplevels: HashMap<u32, Toplevel>,
    finished: bool,
    channel_closed: bool,
}

impl Tracker {
    fn commit(&mut self, id: u32) {
        let Some(toplevel) = self.toplevels.get_mut(&id) else {
            return;
        };

        if let Some(title) = toplevel.pending_title.take() {
            toplevel.title = title;
        }
        if let Some(app_id) = toplevel.pending_app_id.take() {
            toplevel.app_id = app_id;
        }

        let was_activated = toplevel.activated;
        if let Some(activated) = toplevel.pending_activated.take() {
            toplevel.activated = activated;
        }

        if toplevel.activated && !was_activated {
            let event = WindowEvent::new(
                toplevel.app_id.clone(),
                toplevel.title.clone(),
                u64::from(id),
            );
            debug!(
                app_id = %event.app_id,
                window_id = event.window_id,
                "window activated"
            );

            if self.events.blocking_send(event).is_err() {
                self.channel_closed = true;
            }
        }
    }
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for Tracker {
    fn event(
        _tracker: &mut Self,
        _registry: &wl_registry::WlRegistry,
        _event: wl_registry::Event,
        _data: &GlobalListContents,
        _connection: &Connection,
        _queue_handle: &QueueHandle<Self>,
    ) {
        // globals are read once at startup
    }
}

impl Dispatch<ZwlrForeignToplevelManagerV1, ()> for Tracker {
    fn event(
        tracker: &mut Self,
        _manager: &ZwlrForeignToplevelManagerV1,
        event: zwlr_foreign_toplevel_manager_v1::Event,
        _data: &(),
        _connection: &Connection,
        _queue_handle: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_foreign_toplevel_manager_v1::Event::Toplevel { toplevel } => {
                tracker
                    .toplevels
                    .insert(toplevel.id().protocol_id(), Toplevel::default());
            }
            zwlr_foreign_toplevel_manager_v1::Event::Finished => {
                tracker.finished = true;
            }
            _ => {}
        }
    }

    event_created_child!(Tracker, ZwlrForeignToplevelManagerV1, [
        zwlr_foreign_toplevel_manager_v1::EVT_TOPLEVEL_OPCODE => (ZwlrForeignToplevelHandleV1, ()),
    ]);
}

impl Dispatch<ZwlrForeignToplevelHandleV1, ()> for Tracker {
    fn event(
        tracker: &mut Self,
        handle: &ZwlrForeignToplevelHandleV1,
        event: zwlr_foreign_toplevel_handle_v1::Event,
        _data: &(),
        _connection: &Connection,
        _queue_handle: &QueueHandle<Self>,
    ) {
        let id = handle.id().protocol_id();

        match event {
            zwlr_foreign_toplevel_handle_v1::Event::Title { title } => {
                if let Some(toplevel) = tracker.toplevels.get_mut(&id) {
                    toplevel.pending_title = Some(title);
                }
            }
            zwlr_foreign_toplevel_handle_v1::Event::AppId { app_id } => {
                if let Some(toplevel) = tracker.toplevels.get_mut(&id) {
                    toplevel.pending_app_id = Some(app_id);
                }
            }
            zwlr_foreign_toplevel_handle_v1::Event::State { state } => {
                let activated = state
                    .chunks_exact(4)
                    .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                    .any(|value| {
                        value == zwlr_foreign_toplevel_handle_v1::State::Activated as u32
                    });

                if let Some(toplevel) = tracker.toplevels.get_mut(&id) {
                    toplevel.pending_activated = Some(activated);
                }
            }
            zwlr_foreign_toplevel_handle_v1::Event::Done => {
                tracker.commit(id);
            }
            zwlr_foreign_toplevel_handle_v1::Event::Closed => {
                tracker.toplevels.remove(&id);
                handle.destroy();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn tracker_with_channel(capacity: usize) -> (Tracker, mpsc::Receiver<WindowEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let tracker = Tracker {
            events: sender,
            toplevels: HashMap::new(),
            finished: false,
            channel_closed: false,
        };

        (tracker, receiver)
    }

    #[test]
    fn commit_emits_only_on_activation_transition() {
        let (mut tracker, mut receiver) = tracker_with_channel(4);
        tracker.toplevels.insert(7, Toplevel::default());

        let toplevel = tracker.toplevels.get_mut(&7).unwrap();
        toplevel.pending_app_id = Some("org.kde.konsole".to_string());
        toplevel.pending_title = Some("~ : bash".to_string());
        toplevel.pending_activated = Some(true);
        tracker.commit(7);

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.app_id, "org.kde.konsole");
        assert_eq!(event.caption, "~ : bash");
        assert_eq!(event.window_id, 7);

        // a second commit without a transition stays silent
        let toplevel = tracker.toplevels.get_mut(&7).unwrap();
        toplevel.pending_title = Some("vim : bash".to_string());
        tracker.commit(7);

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn commit_ignores_deactivation() {
        let (mut tracker, mut receiver) = tracker_with_channel(4);
        tracker.toplevels.insert(3, Toplevel::default());

        let toplevel = tracker.toplevels.get_mut(&3).unwrap();
        toplevel.activated = true;
        toplevel.pending_activated = Some(false);
        tracker.commit(3);

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn commit_on_unknown_toplevel_is_harmless() {
        let (mut tracker, mut receiver) = tracker_with_channel(4);

        tracker.commit(99);

        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn commit_marks_channel_closed_when_receiver_is_gone() {
        let (mut tracker, receiver) = tracker_with_channel(4);
        drop(receiver);

        tracker.toplevels.insert(1, Toplevel::default());
        let toplevel = tracker.toplevels.get_mut(&1).unwrap();
        toplevel.pending_activated = Some(true);
        tracker.commit(1);

        assert!(tracker.channel_closed);
    }

    #[test]
    fn watcher_can_be_created_or_fails_gracefully() {
        let watcher = WaylandWindowWatcher::new();

        match watcher {
            Some(watcher) => assert_eq!(watcher.name(), "wayland"),
            None => println!("Wayland not available (expected in CI)"),
        }
    }
}
