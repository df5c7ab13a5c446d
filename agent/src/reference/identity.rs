//! A static [`DeviceIdentity`] for environments where device id and firmware
//! version are just fixed strings (baked in at provisioning time).

use crate::contracts::DeviceIdentity;

pub struct StaticIdentity {
    device_id: Option<String>,
    firmware_version: Option<String>,
}

impl StaticIdentity {
    pub fn new(device_id: impl Into<String>, firmware_version: impl Into<String>) -> Self {
        StaticIdentity {
            device_id: Some(device_id.into()),
            firmware_version: Some(firmware_version.into()),
        }
    }
}

impl DeviceIdentity for StaticIdentity {
    fn device_id(&self) -> Option<String> {
        self.device_id.clone()
    }

    fn firmware_version(&self) -> Option<String> {
        self.firmware_version.clone()
    }
}
