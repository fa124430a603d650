//! In-process snapshot lists.

use super::{SnapshotSource, pick};
use crate::entity::{Device, Screen};
use crate::error::{Result, SnapshotKind};

/// Snapshots pushed by the caller, oldest first.
///
/// Layouts are kept as raw XML and parsed on every request, so each
/// definition gets its own [`Screen`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    layouts: Vec<(String, String)>,
    devices: Vec<Device>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layout dump; it becomes the current one.
    pub fn push_layout(&mut self, id: impl Into<String>, xml: impl Into<String>) -> &mut Self {
        self.layouts.push((id.into(), xml.into()));
        self
    }

    /// Append device facts; they become the current ones.
    pub fn push_device(&mut self, device: Device) -> &mut Self {
        self.devices.push(device);
        self
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl SnapshotSource for MemorySource {
    fn layout(&self, previous: bool) -> Result<Screen> {
        let (id, xml) = &self.layouts[pick(SnapshotKind::Layout, self.layouts.len(), previous)?];
        Ok(Screen::from_xml(id.clone(), xml))
    }

    fn device_info(&self, previous: bool) -> Result<Device> {
        Ok(self.devices[pick(SnapshotKind::DeviceInfo, self.devices.len(), previous)?].clone())
    }
}
