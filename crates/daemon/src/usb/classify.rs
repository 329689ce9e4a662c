//! Phone-likeness classification
//!
//! Two policies decide whether a snapshot contains a phone-like device:
//!
//! - the class heuristic accepts any device exposing a still-image/PTP,
//!   wireless-controller, or vendor-specific interface anywhere in its
//!   descriptor tree. Handsets commonly surface MTP behind still-image,
//!   RNDIS tethering behind wireless-controller, and their platform stacks
//!   behind vendor-specific, but unrelated peripherals can too: false
//!   positives and negatives are accepted, this is presence sniffing, not
//!   identification.
//! - the id allow-list accepts only explicitly listed vendor/product pairs,
//!   for deployments that know their fleet.

use crate::usb::enumerate::DeviceSnapshot;
use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

/// Still-image/PTP interface class, the usual MTP carrier.
const CLASS_STILL_IMAGE: u8 = 0x06;
/// Wireless-controller class, exposed by RNDIS tethering stacks.
const CLASS_WIRELESS_CONTROLLER: u8 = 0xE0;
/// Vendor-specific class, the catch-all for vendor USB stacks.
const CLASS_VENDOR_SPECIFIC: u8 = 0xFF;

/// Pure predicate: does this interface class look phone-like?
pub fn is_phone_class(class: u8) -> bool {
    matches!(
        class,
        CLASS_STILL_IMAGE | CLASS_WIRELESS_CONTROLLER | CLASS_VENDOR_SPECIFIC
    )
}

/// Detection strategy selected in the daemon configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionStrategy {
    #[default]
    ClassHeuristic,
    IdAllowlist,
}

/// A `VID:PID` match pattern; `*` wildcards either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    vendor: Option<u16>,
    product: Option<u16>,
}

impl DeviceFilter {
    /// Parse a pattern like `0x18d1:0x4ee1`, `0x18d1:*`, or `*:*`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let parts: Vec<&str> = pattern.split(':').collect();
        if parts.len() != 2 {
            bail!(
                "Invalid filter format '{}', expected VID:PID (e.g., '0x18d1:0x4ee1' or '0x18d1:*')",
                pattern
            );
        }

        Ok(Self {
            vendor: parse_id(parts[0], "VID")?,
            product: parse_id(parts[1], "PID")?,
        })
    }

    /// Whether a vendor/product pair satisfies this pattern.
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor.is_none_or(|v| v == vendor_id) && self.product.is_none_or(|p| p == product_id)
    }
}

fn parse_id(id: &str, name: &str) -> Result<Option<u16>> {
    if id == "*" {
        return Ok(None);
    }

    let hex = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("Invalid {} '{}', must start with '0x' (e.g., '0x18d1')", name, id))?;

    if hex.is_empty() || hex.len() > 4 {
        bail!("Invalid {} '{}', hex part must be 1-4 digits", name, id);
    }

    u16::from_str_radix(hex, 16)
        .map(Some)
        .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
}

/// The classifier's decision procedure, fixed at daemon startup.
#[derive(Debug, Clone)]
pub enum DetectionPolicy {
    ClassHeuristic,
    IdAllowlist(Vec<DeviceFilter>),
}

impl DetectionPolicy {
    /// True when one device satisfies the policy. The first matching leaf
    /// decides; nothing past it is examined.
    pub fn matches_device(&self, device: &DeviceSnapshot) -> bool {
        match self {
            DetectionPolicy::ClassHeuristic => {
                device.class_leaves().any(|leaf| is_phone_class(leaf.class))
            }
            DetectionPolicy::IdAllowlist(filters) => filters
                .iter()
                .any(|filter| filter.matches(device.vendor_id, device.product_id)),
        }
    }

    /// Scan a snapshot set, short-circuiting on the first matching device.
    pub fn any_phone_like(&self, devices: &[DeviceSnapshot]) -> bool {
        devices.iter().any(|device| self.matches_device(device))
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DetectionPolicy::ClassHeuristic => "class-heuristic",
            DetectionPolicy::IdAllowlist(_) => "id-allowlist",
        }
    }
}
