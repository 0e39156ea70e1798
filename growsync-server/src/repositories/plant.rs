use std::sync::Arc;

use sqlx::Error;

use crate::configs::Storage;
use crate::models::Plant;

pub struct PlantRepository {
    storage: Arc<Storage>,
}

impl PlantRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Plant>, Error> {
        let plant: Option<Plant> = sqlx::query_as("SELECT * FROM plants WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(plant)
    }

    /// Active plants with a currently-active assignment to the given
    /// device. Target set for hydro-controller data.
    pub async fn find_active_by_assigned_device(&self, device_id: i32) -> Result<Vec<Plant>, Error> {
        let plants: Vec<Plant> = sqlx::query_as(
            r#"
            SELECT plants.* FROM plants
            JOIN device_assignments ON device_assignments.plant_id = plants.id
            WHERE device_assignments.device_id = $1
              AND device_assignments.removed_at IS NULL
              AND plants.end_date IS NULL
            "#,
        )
        .bind(device_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(plants)
    }

    /// Active plants whose actively-assigned device sits in the given
    /// location. Fan-out target set for room-scoped environmental sensors.
    pub async fn find_active_by_device_location(
        &self,
        location_id: i32,
    ) -> Result<Vec<Plant>, Error> {
        let plants: Vec<Plant> = sqlx::query_as(
            r#"
            SELECT DISTINCT plants.* FROM plants
            JOIN device_assignments ON device_assignments.plant_id = plants.id
            JOIN devices ON devices.id = device_assignments.device_id
            WHERE devices.location_id = $1
              AND device_assignments.removed_at IS NULL
              AND plants.end_date IS NULL
            "#,
        )
        .bind(location_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(plants)
    }
}
