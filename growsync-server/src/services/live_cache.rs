use std::collections::HashMap;

use growsync_api::EnvironmentReading;
use tokio::sync::RwLock;

/// Latest environment reading per device, fed by the high-frequency
/// heartbeat. Never persisted: history comes from daily reports, and the
/// cache rebuilds itself as devices check in after a restart.
pub struct LiveCacheService {
    readings: RwLock<HashMap<i32, EnvironmentReading>>,
}

impl LiveCacheService {
    pub fn new() -> Self {
        Self {
            readings: RwLock::new(HashMap::new()),
        }
    }

    pub async fn update(&self, device_id: i32, reading: EnvironmentReading) {
        let mut readings = self.readings.write().await;
        readings.insert(device_id, reading);
    }

    pub async fn latest(&self, device_id: i32) -> Option<EnvironmentReading> {
        let readings = self.readings.read().await;
        readings.get(&device_id).cloned()
    }

    pub async fn remove(&self, device_id: i32) {
        let mut readings = self.readings.write().await;
        readings.remove(&device_id);
    }
}

impl Default for LiveCacheService {
    fn default() -> Self {
        Self::new()
    }
}
