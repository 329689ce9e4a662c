//! Point-in-time USB topology snapshots
//!
//! A snapshot records, per attached device, its vendor/product ids and the
//! flattened list of interface class triples gathered by walking every
//! configuration, every interface, and every alternate setting. Snapshots
//! are cheap, never cached, and tolerate devices vanishing mid-walk: a
//! device that cannot be read is skipped, so a hot-unplug during a scan
//! degrades to "absent" rather than an error.

use rusb::{Context, Device, UsbContext};
use tracing::{debug, trace, warn};

/// One interface alternate setting's class identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTriple {
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

/// One attached device as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Flattened configuration → interface → alternate-setting leaves.
    pub interfaces: Vec<ClassTriple>,
}

impl DeviceSnapshot {
    /// Iterate the descriptor leaves in traversal order.
    pub fn class_leaves(&self) -> impl Iterator<Item = &ClassTriple> {
        self.interfaces.iter()
    }
}

/// Source of topology snapshots.
///
/// Enumeration failures are not surfaced through this trait: a source that
/// cannot read the bus logs the condition and produces an empty (or
/// partial) snapshot, and detection then reports absence. That matches the
/// detect contract, which answers "is a phone-like device visible right
/// now" rather than "is the USB stack healthy".
pub trait DeviceEnumerator: Send + Sync {
    fn snapshot(&self) -> Vec<DeviceSnapshot>;
}

/// Live enumerator over the host's USB topology.
pub struct RusbEnumerator {
    context: Context,
}

impl RusbEnumerator {
    pub fn new() -> Result<Self, rusb::Error> {
        let context = Context::new()?;
        Ok(Self { context })
    }
}

impl DeviceEnumerator for RusbEnumerator {
    fn snapshot(&self) -> Vec<DeviceSnapshot> {
        let devices = match self.context.devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("USB enumeration failed: {}", e);
                return Vec::new();
            }
        };

        let mut snapshots = Vec::new();
        for device in devices.iter() {
            match snapshot_device(&device) {
                Ok(Some(snapshot)) => snapshots.push(snapshot),
                Ok(None) => {}
                Err(e) => {
                    // Typically a device detached between listing and read.
                    debug!(
                        "Skipping device bus={} addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                }
            }
        }

        trace!("Snapshot captured {} devices", snapshots.len());
        snapshots
    }
}

/// Read one device's descriptor tree into a snapshot.
///
/// Returns `Ok(None)` for root hubs (VID 0x1d6b, class 9): they are bus
/// infrastructure and can never be a handset.
fn snapshot_device(device: &Device<Context>) -> Result<Option<DeviceSnapshot>, rusb::Error> {
    let desc = device.device_descriptor()?;

    if desc.vendor_id() == 0x1d6b && desc.class_code() == 9 {
        return Ok(None);
    }

    let mut snapshot = DeviceSnapshot {
        vendor_id: desc.vendor_id(),
        product_id: desc.product_id(),
        interfaces: Vec::new(),
    };

    for index in 0..desc.num_configurations() {
        let config = match device.config_descriptor(index) {
            Ok(config) => config,
            Err(e) => {
                debug!(
                    "Unreadable config {} on {:04x}:{:04x}: {}",
                    index, snapshot.vendor_id, snapshot.product_id, e
                );
                continue;
            }
        };

        for interface in config.interfaces() {
            for alt in interface.descriptors() {
                snapshot.interfaces.push(ClassTriple {
                    class: alt.class_code(),
                    subclass: alt.sub_class_code(),
                    protocol: alt.protocol_code(),
                });
            }
        }
    }

    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_leaves_preserve_traversal_order() {
        let snapshot = DeviceSnapshot {
            vendor_id: 0x18d1,
            product_id: 0x4ee1,
            interfaces: vec![
                ClassTriple {
                    class: 0x01,
                    subclass: 0x01,
                    protocol: 0x00,
                },
                ClassTriple {
                    class: 0x06,
                    subclass: 0x01,
                    protocol: 0x01,
                },
            ],
        };

        let classes: Vec<u8> = snapshot.class_leaves().map(|leaf| leaf.class).collect();
        assert_eq!(classes, vec![0x01, 0x06]);
    }
}
