//! BLE Service and Characteristic UUIDs.
//!
//! BerryMed oximeters stream over the Microchip/ISSC transparent UART service.

use uuid::Uuid;

/// Transparent UART data service UUID.
pub const DATA_SERVICE_UUID: Uuid = Uuid::from_u128(0x4953_5343_fe7d_4ae5_8fa9_9fafd205e455);
/// Receive characteristic UUID (Notify). Carries the BCI byte stream.
pub const RECEIVE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x4953_5343_1e4d_4bd9_ba61_23c647249616);

/// Local name advertised by BerryMed oximeters.
pub const DEVICE_NAME: &str = "BerryMed";

/// Check if a service UUID is the oximeter data service.
pub fn is_data_service(uuid: &Uuid) -> bool {
    *uuid == DATA_SERVICE_UUID
}
