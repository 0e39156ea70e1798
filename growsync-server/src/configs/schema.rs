use crate::models::{
    DeviceAssignmentTable, DeviceFirmwareAssignmentTable, DeviceLinkTable, DeviceShareTable,
    DeviceTable, DosingEventTable, FirmwareTable, LightEventTable, LocationShareTable,
    LocationTable, PlantDailyLogTable, PlantTable, PostingSlotTable, Table, UserTable,
};

/// Owns the table set and emits DDL in dependency order, so a clean start
/// can create (and dispose, reversed) the whole schema in one pass.
pub struct SchemaManager {
    tables: Vec<Box<dyn Table>>,
}

impl SchemaManager {
    pub fn new(tables: Vec<Box<dyn Table>>) -> Self {
        Self {
            tables: Self::sort_tables(tables),
        }
    }

    fn sort_tables(mut pending: Vec<Box<dyn Table>>) -> Vec<Box<dyn Table>> {
        let mut sorted: Vec<Box<dyn Table>> = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let resolved: Vec<usize> = pending
                .iter()
                .enumerate()
                .filter(|(_, table)| {
                    table
                        .dependencies()
                        .iter()
                        .all(|dep| sorted.iter().any(|done| done.name() == *dep))
                })
                .map(|(index, _)| index)
                .collect();

            assert!(
                !resolved.is_empty(),
                "Circular dependency detected or unresolved dependencies exist."
            );

            for index in resolved.into_iter().rev() {
                sorted.push(pending.swap_remove(index));
            }
        }

        sorted
    }

    pub fn create_schema(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.create()).collect()
    }

    pub fn dispose_schema(&self) -> Vec<String> {
        self.tables.iter().rev().map(|table| table.dispose()).collect()
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        SchemaManager::new(vec![
            Box::new(UserTable),
            Box::new(LocationTable),
            Box::new(DeviceTable),
            Box::new(DeviceShareTable),
            Box::new(LocationShareTable),
            Box::new(PlantTable),
            Box::new(DeviceAssignmentTable),
            Box::new(DeviceLinkTable),
            Box::new(PostingSlotTable),
            Box::new(PlantDailyLogTable),
            Box::new(DosingEventTable),
            Box::new(LightEventTable),
            Box::new(FirmwareTable),
            Box::new(DeviceFirmwareAssignmentTable),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_orders_dependencies_first() {
        let manager = SchemaManager::default();
        let statements = manager.create_schema();

        let position = |table: &str| {
            statements
                .iter()
                .position(|ddl| ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table} ")))
                .unwrap_or_else(|| panic!("missing DDL for {table}"))
        };

        assert!(position("users") < position("devices"));
        assert!(position("locations") < position("devices"));
        assert!(position("devices") < position("device_posting_slots"));
        assert!(position("plants") < position("plant_daily_logs"));
        assert!(position("firmware") < position("device_firmware_assignments"));
    }

    #[test]
    fn dispose_is_reverse_of_create() {
        let manager = SchemaManager::default();
        let creates = manager.create_schema();
        let disposes = manager.dispose_schema();

        assert_eq!(creates.len(), disposes.len());
        assert!(disposes.first().unwrap().contains("DROP TABLE"));
    }
}
