use std::collections::HashMap;

use axum::extract::ws::Message as WsMessage;
use growsync_api::ControlMessage;
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

type Sender = mpsc::UnboundedSender<WsMessage>;

/// In-process relay state: one sender per connected device, and the set of
/// dashboard viewers attached to each device id.
///
/// Owned service state injected via `Arc`, never a module global. The
/// RwLock keeps map mutations safe under the multi-threaded runtime;
/// entries live exactly as long as their socket tasks.
pub struct ConnectionService {
    devices: RwLock<HashMap<String, Sender>>,
    viewers: RwLock<HashMap<String, Vec<(Uuid, Sender)>>>,
}

impl ConnectionService {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            viewers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a device socket. Call only after the persistent online
    /// mark succeeded, so the map never claims a device the database
    /// believes is offline.
    pub async fn register_device(&self, device_id: &str, sender: Sender) {
        let mut devices = self.devices.write().await;
        devices.insert(device_id.to_string(), sender);
    }

    pub async fn remove_device(&self, device_id: &str) -> bool {
        let mut devices = self.devices.write().await;
        devices.remove(device_id).is_some()
    }

    pub async fn is_device_connected(&self, device_id: &str) -> bool {
        let devices = self.devices.read().await;
        devices.contains_key(device_id)
    }

    /// Forwards a frame to the device socket. False means the device is
    /// not connected (or its channel already closed); callers surface that
    /// explicitly instead of dropping silently.
    pub async fn send_to_device(&self, device_id: &str, message: WsMessage) -> bool {
        let devices = self.devices.read().await;

        match devices.get(device_id) {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Attaches a viewer; returns its id and the viewer count after the
    /// attach (1 = this is the first viewer).
    pub async fn attach_viewer(&self, device_id: &str, sender: Sender) -> (Uuid, usize) {
        let viewer_id = Uuid::new_v4();
        let mut viewers = self.viewers.write().await;
        let entry = viewers.entry(device_id.to_string()).or_default();
        entry.push((viewer_id, sender));

        (viewer_id, entry.len())
    }

    /// Detaches a viewer; returns how many remain (0 = that was the last).
    pub async fn detach_viewer(&self, device_id: &str, viewer_id: Uuid) -> usize {
        let mut viewers = self.viewers.write().await;

        match viewers.get_mut(device_id) {
            Some(entry) => {
                entry.retain(|(id, _)| *id != viewer_id);
                let remaining = entry.len();
                if remaining == 0 {
                    viewers.remove(device_id);
                }
                remaining
            }
            None => 0,
        }
    }

    pub async fn viewer_count(&self, device_id: &str) -> usize {
        let viewers = self.viewers.read().await;
        viewers.get(device_id).map_or(0, |entry| entry.len())
    }

    /// Relays a frame to every attached viewer. A viewer whose channel has
    /// closed is skipped; its socket task cleans it up on detach.
    pub async fn broadcast_to_viewers(&self, device_id: &str, message: WsMessage) {
        let viewers = self.viewers.read().await;

        if let Some(entry) = viewers.get(device_id) {
            for (viewer_id, sender) in entry {
                if sender.send(message.clone()).is_err() {
                    tracing::debug!("viewer {} channel closed for {}", viewer_id, device_id);
                }
            }
        }
    }

    /// Presence notification to viewers, `{type: device_status, online}`.
    pub async fn notify_device_status(&self, device_id: &str, online: bool) {
        let frame = serde_json::to_string(&ControlMessage::DeviceStatus { online })
            .expect("control message serializes");

        self.broadcast_to_viewers(device_id, WsMessage::Text(frame))
            .await;
    }
}

impl Default for ConnectionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (Sender, mpsc::UnboundedReceiver<WsMessage>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn device_relay_reaches_all_viewers() {
        let service = ConnectionService::new();
        let (viewer_a, mut rx_a) = channel();
        let (viewer_b, mut rx_b) = channel();

        service.attach_viewer("dev-1", viewer_a).await;
        service.attach_viewer("dev-1", viewer_b).await;

        service
            .broadcast_to_viewers("dev-1", WsMessage::Text("{\"ph\":6.1}".into()))
            .await;

        assert!(matches!(rx_a.try_recv().unwrap(), WsMessage::Text(text) if text.contains("6.1")));
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn send_to_disconnected_device_reports_offline() {
        let service = ConnectionService::new();

        assert!(
            !service
                .send_to_device("dev-9", WsMessage::Text("{}".into()))
                .await
        );

        let (device_tx, mut device_rx) = channel();
        service.register_device("dev-9", device_tx).await;

        assert!(
            service
                .send_to_device("dev-9", WsMessage::Text("{}".into()))
                .await
        );
        assert!(device_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn viewer_counts_drive_first_and_last_signals() {
        let service = ConnectionService::new();
        let (viewer_a, _rx_a) = channel();
        let (viewer_b, _rx_b) = channel();

        let (id_a, count_a) = service.attach_viewer("dev-2", viewer_a).await;
        let (id_b, count_b) = service.attach_viewer("dev-2", viewer_b).await;
        assert_eq!(count_a, 1);
        assert_eq!(count_b, 2);

        assert_eq!(service.detach_viewer("dev-2", id_a).await, 1);
        assert_eq!(service.detach_viewer("dev-2", id_b).await, 0);
        assert_eq!(service.viewer_count("dev-2").await, 0);
    }
}
