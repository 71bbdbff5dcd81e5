//! Device registry: a small, bounded table of borrowed devices, looked up
//! by id during dispatch. `spec.md` §3: the registry holds references to
//! user-supplied device structs that must outlive the SDK, not owned
//! copies — the original SDK's fixed-size array of pointers, not a value
//! store. The bound on table size carries over unchanged.

use crate::device::Device;
use crate::error::{OverflowKind, SdkError};

pub const MAX_DEVICES: usize = 8;

#[derive(Default)]
pub struct DeviceRegistry<'a> {
    devices: Vec<&'a mut Device>,
}

impl<'a> DeviceRegistry<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    pub fn add_device(&mut self, device: &'a mut Device) -> Result<(), SdkError> {
        if self.devices.len() >= MAX_DEVICES {
            return Err(SdkError::Overflow(OverflowKind::DeviceTableFull { max: MAX_DEVICES }));
        }
        if self.devices.iter().any(|d| d.id() == device.id()) {
            return Err(SdkError::Config(crate::error::ConfigError::InvalidDeviceId(device.id().to_string())));
        }
        self.devices.push(device);
        Ok(())
    }

    /// Hands back the caller's own reference — the registry never owned
    /// it, it merely forgets it. `None` if no device with that id was
    /// registered.
    pub fn remove_device(&mut self, device_id: &str) -> Option<&'a mut Device> {
        let index = self.devices.iter().position(|d| d.id() == device_id)?;
        Some(self.devices.remove(index))
    }

    #[must_use]
    pub fn find_device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id() == device_id).map(|d| &**d)
    }

    pub fn find_device_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.id() == device_id).map(|d| &mut **d)
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut().map(|d| &mut **d)
    }
}
