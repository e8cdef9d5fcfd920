//! Audio module for playback device enumeration and switching.
//!
//! This module provides the external-command device source adapter, the
//! device data model, and the reconciliation store all UI surfaces read.

pub mod adapter;
pub mod device;
pub mod store;

pub use adapter::{AdapterEvent, DeviceCommands, INSTALL_TIMEOUT};
pub use device::{AdapterError, DeviceName, PlaybackDevice};
pub use store::DeviceStore;
