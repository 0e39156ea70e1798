use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::configs::{Posting, Storage};
use crate::errors::{ApiError, SlotError};
use crate::models::Device;
use crate::repositories::{DeviceRepository, PostingSlotRepository};

/// The nightly reporting window, in whole hours. Duration is what the
/// allocator spreads slots across.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PostingWindow {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl PostingWindow {
    pub fn duration_minutes(&self) -> i32 {
        (self.end_hour as i32 - self.start_hour as i32) * 60
    }
}

/// Runtime-mutable posting window, seeded from boot settings. Every slot
/// computation re-reads it; changing it never moves existing assignments.
pub struct PostingConfig {
    window: RwLock<PostingWindow>,
}

impl PostingConfig {
    pub fn new(posting: &Posting) -> Self {
        Self {
            window: RwLock::new(PostingWindow {
                start_hour: posting.window_start_hour,
                end_hour: posting.window_end_hour,
            }),
        }
    }

    pub async fn window(&self) -> PostingWindow {
        *self.window.read().await
    }

    pub async fn set_window(&self, start_hour: u8, end_hour: u8) -> Result<(), SlotError> {
        if start_hour >= end_hour || end_hour > 23 {
            return Err(SlotError::InvalidWindow);
        }

        let mut window = self.window.write().await;
        *window = PostingWindow {
            start_hour,
            end_hour,
        };

        tracing::info!(
            "posting window updated: {:02}:00 - {:02}:00",
            start_hour,
            end_hour
        );

        Ok(())
    }
}

/// Picks the minute offset farthest from its neighbours: scans the gap
/// before the first slot, the gaps between consecutive slots, then the gap
/// after the last slot, and bisects the largest. Strict comparison keeps
/// the first-found maximum, so the scan order is part of the contract.
///
/// Greedy, not globally optimal for already-uneven layouts; periodic
/// rebalance restores evenness.
pub fn find_best_slot(assigned_slots: &[i32], window_duration: i32) -> i32 {
    let Some((&first, rest)) = assigned_slots.split_first() else {
        return 0;
    };

    let mut max_gap = 0;
    let mut best_slot = 0;

    if first > max_gap {
        max_gap = first;
        best_slot = first / 2;
    }

    let mut previous = first;
    for &slot in rest {
        let gap = slot - previous;
        if gap > max_gap {
            max_gap = gap;
            best_slot = previous + gap / 2;
        }
        previous = slot;
    }

    let last_gap = window_duration - previous;
    if last_gap > max_gap {
        best_slot = previous + last_gap / 2;
    }

    best_slot
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotAssignment {
    pub device_id: String,
    pub device_type: String,
    pub assigned_minute: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalanceSummary {
    pub devices_count: usize,
    pub window_duration: i32,
    pub assignments: Vec<SlotAssignment>,
}

/// Slot bookkeeping around the pure heuristic. Read-then-insert is not
/// serialized across processes; collision freedom assumes a single writer
/// instance.
pub struct PostingSlotService {
    storage: Arc<Storage>,
    device_repository: Arc<DeviceRepository>,
    slot_repository: Arc<PostingSlotRepository>,
    config: Arc<PostingConfig>,
}

impl PostingSlotService {
    pub fn new(
        storage: Arc<Storage>,
        device_repository: Arc<DeviceRepository>,
        slot_repository: Arc<PostingSlotRepository>,
        config: Arc<PostingConfig>,
    ) -> Self {
        Self {
            storage,
            device_repository,
            slot_repository,
            config,
        }
    }

    pub fn config(&self) -> &PostingConfig {
        &self.config
    }

    pub async fn get_slot(&self, device_id: i32) -> Result<Option<i32>, ApiError> {
        let slot = self.slot_repository.find_by_device_id(device_id).await?;

        Ok(slot.map(|slot| slot.assigned_minute))
    }

    /// Assigns a fresh slot. Misuse (wrong type, double assign) surfaces as
    /// a caller error distinct from transient failures.
    pub async fn assign_slot(&self, device: &Device) -> Result<i32, ApiError> {
        if !device.requires_posting_slot() {
            return Err(SlotError::TypeNotEligible.into());
        }

        if self
            .slot_repository
            .find_by_device_id(device.id)
            .await?
            .is_some()
        {
            return Err(SlotError::AlreadyAssigned.into());
        }

        let window = self.config.window().await;
        let assigned_slots = self.slot_repository.assigned_minutes().await?;
        let new_slot = find_best_slot(&assigned_slots, window.duration_minutes());

        self.slot_repository.insert(device.id, new_slot).await?;

        tracing::info!(
            "assigned posting slot {} to device {} ({})",
            new_slot,
            device.device_id,
            device.device_type
        );

        Ok(new_slot)
    }

    /// Lazy path used by check-in endpoints: eligible devices get a slot on
    /// first contact, others simply have none.
    pub async fn ensure_slot(&self, device: &Device) -> Result<Option<i32>, ApiError> {
        if !device.requires_posting_slot() {
            return Ok(None);
        }

        if let Some(slot) = self.slot_repository.find_by_device_id(device.id).await? {
            return Ok(Some(slot.assigned_minute));
        }

        self.assign_slot(device).await.map(Some)
    }

    pub async fn remove_slot(&self, device_id: i32) -> Result<bool, ApiError> {
        let removed = self.slot_repository.delete_by_device_id(device_id).await?;

        if removed {
            tracing::info!("removed posting slot for device {}", device_id);
        }

        Ok(removed)
    }

    /// Drops every assignment and lays eligible devices out evenly across
    /// the window, in one transaction: device i of n gets
    /// `i * window / n`, ordered by creation.
    pub async fn rebalance_all(&self) -> Result<RebalanceSummary, ApiError> {
        let devices = self.device_repository.find_slot_eligible().await?;
        let window = self.config.window().await;
        let window_duration = window.duration_minutes();

        if devices.is_empty() {
            return Ok(RebalanceSummary {
                devices_count: 0,
                window_duration,
                assignments: Vec::new(),
            });
        }

        let mut transaction = self.storage.get_pool().begin().await?;
        self.slot_repository.delete_all_in(&mut transaction).await?;

        let device_count = devices.len();
        let mut assignments = Vec::with_capacity(device_count);

        for (ordinal, device) in devices.iter().enumerate() {
            let assigned_minute =
                (ordinal as i64 * window_duration as i64 / device_count as i64) as i32;

            self.slot_repository
                .insert_in(device.id, assigned_minute, &mut transaction)
                .await?;

            assignments.push(SlotAssignment {
                device_id: device.device_id.clone(),
                device_type: device.device_type.clone(),
                assigned_minute,
            });
        }

        transaction.commit().await?;

        tracing::info!(
            "rebalanced {} devices across {} minute window",
            device_count,
            window_duration
        );

        Ok(RebalanceSummary {
            devices_count: device_count,
            window_duration,
            assignments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_starts_at_zero() {
        assert_eq!(find_best_slot(&[], 300), 0);
    }

    #[test]
    fn bisects_largest_gap_after_last_slot() {
        // Gaps: before-first 0, between 100, after-last 200 -> 100 + 200/2.
        assert_eq!(find_best_slot(&[0, 100], 300), 200);
    }

    #[test]
    fn bisects_gap_before_first_slot() {
        assert_eq!(find_best_slot(&[200, 250], 300), 100);
    }

    #[test]
    fn bisects_between_pair_when_interior_gap_wins() {
        assert_eq!(find_best_slot(&[0, 200, 250, 290], 300), 100);
    }

    #[test]
    fn ties_keep_first_found_gap() {
        // before-first and after-last both 100; the scan sees before-first
        // first.
        assert_eq!(find_best_slot(&[100, 200], 300), 50);
    }

    #[test]
    fn window_duration_follows_configured_hours() {
        let window = PostingWindow {
            start_hour: 1,
            end_hour: 6,
        };
        assert_eq!(window.duration_minutes(), 300);
    }
}
