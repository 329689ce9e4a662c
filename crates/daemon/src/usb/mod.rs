//! USB phone-presence detection
//!
//! Implements the detection side of the dispatcher:
//! - Point-in-time topology snapshots (device and flattened interface
//!   class triples), re-taken on every detect call
//! - Classification policies deciding phone-likeness over a snapshot
//!
//! Enumeration and classification are deliberately separate: the policy is
//! a pure function over snapshot data, so it can be exercised without
//! hardware, and a device unplugged mid-scan simply drops out of the
//! snapshot and reads as absent.

pub mod classify;
pub mod enumerate;

// Re-export public types
pub use classify::{DetectionPolicy, DetectionStrategy, DeviceFilter, is_phone_class};
pub use enumerate::{ClassTriple, DeviceEnumerator, DeviceSnapshot, RusbEnumerator};
