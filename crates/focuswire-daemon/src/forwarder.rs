use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use zbus::Proxy;

use focuswire_core::{CallArgs, Field, ListenerConfig, WindowEvent};

use crate::watcher::EventSender;

/// Forwards each window event as one fire-and-forget call on the session
/// bus. No retry, no reply: a failed call is logged and dropped.
pub struct ForwarderActor {
    receiver: mpsc::Receiver<WindowEvent>,
    listener: ListenerConfig,
    fields: Vec<Field>,
}

impl ForwarderActor {
    pub fn new(listener: ListenerConfig) -> (Self, EventSender) {
        let (sender, receiver) = mpsc::channel(32);
        let fields = listener.call_fields();

        let actor = Self {
            receiver,
            listener,
            fields,
        };

        (actor, sender)
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let connection = zbus::Connection::session()
            .await
            .context("failed to connect to the session bus")?;

        let proxy = Proxy::new(
            &connection,
            self.listener.service.clone(),
            self.listener.path.clone(),
            self.listener.interface().to_string(),
        )
        .await
        .context("failed to build the listener proxy")?;

        info!(
            service = %self.listener.service,
            path = %self.listener.path,
            method = %self.listener.method,
            "forwarding window events"
        );

        loop {
            tokio::select! {
                maybe_event = self.receiver.recv() => match maybe_event {
                    Some(event) => self.forward(&proxy, event).await,
                    None => {
                        info!("window watcher disconnected, stopping forwarder");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn forward(&self, proxy: &Proxy<'_>, event: WindowEvent) {
        debug!(
            app_id = %event.app_id,
            caption = %event.caption,
            window_id = event.window_id,
            "forwarding window event"
        );

        let method = self.listener.method.as_str();
        let result = match event.call_args(&self.fields) {
            CallArgs::One(a) => proxy.call_noreply(method, &(a,)).await,
            CallArgs::Two(a, b) => proxy.call_noreply(method, &(a, b)).await,
            CallArgs::Three(a, b, c) => proxy.call_noreply(method, &(a, b, c)).await,
        };

        if let Err(error) = result {
            // fire and forget, no retry
            warn!(%error, method, "failed to forward window event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_queue_on_the_actor_channel() {
        let (mut actor, sender) = ForwarderActor::new(ListenerConfig::default());

        sender
            .send(WindowEvent::new("navigator.Firefox", "Rust", 42))
            .await
            .unwrap();
        drop(sender);

        assert_eq!(
            actor.receiver.recv().await,
            Some(WindowEvent::new("navigator.Firefox", "Rust", 42))
        );
        assert_eq!(actor.receiver.recv().await, None);
    }

    #[test]
    fn projection_is_fixed_at_construction() {
        let listener = ListenerConfig {
            fields: vec![Field::Caption, Field::Caption, Field::AppId],
            ..ListenerConfig::default()
        };

        let (actor, _sender) = ForwarderActor::new(listener);

        assert_eq!(actor.fields, vec![Field::Caption, Field::AppId]);
    }
}
