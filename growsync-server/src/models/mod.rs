mod device;
mod device_assignment;
mod device_firmware_assignment;
mod device_link;
mod device_share;
mod dosing_event;
mod firmware;
mod light_event;
mod location;
mod location_share;
mod plant;
mod plant_daily_log;
mod posting_slot;
mod user;

pub use device::{Device, DeviceTable};
pub use device_assignment::{DeviceAssignment, DeviceAssignmentTable};
pub use device_firmware_assignment::{DeviceFirmwareAssignment, DeviceFirmwareAssignmentTable};
pub use device_link::{DeviceLink, DeviceLinkTable};
pub use device_share::{DeviceShare, DeviceShareTable};
pub use dosing_event::{DosingEvent, DosingEventTable};
pub use firmware::{Firmware, FirmwareTable};
pub use light_event::{LightEvent, LightEventTable};
pub use location::{Location, LocationTable};
pub use location_share::{LocationShare, LocationShareTable};
pub use plant::{Plant, PlantTable};
pub use plant_daily_log::{PlantDailyLog, PlantDailyLogTable};
pub use posting_slot::{PostingSlot, PostingSlotTable};
pub use user::{User, UserTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
