//! Audio device data models.
//!
//! Defines the core data structures for representing playback devices,
//! their parsed names, and the adapter error taxonomy.

use serde::Deserialize;
use thiserror::Error;

/// A playback device as reported by the enumeration command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaybackDevice {
    /// Opaque device ID, stable across reboots for the same endpoint
    pub id: String,

    /// Human-readable device name as reported by the OS
    pub name: String,

    /// Whether the OS currently routes audio to this device
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl PlaybackDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default: false,
        }
    }

    /// Parsed `{kind, hardware}` view of the raw name.
    pub fn parsed_name(&self) -> DeviceName {
        DeviceName::parse(&self.name)
    }
}

/// A device name split into its type and hardware parts.
///
/// Windows reports playback endpoints as `Type (Hardware)`, e.g.
/// `Speakers (Realtek High Definition Audio)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceName {
    /// Endpoint type, e.g. "Speakers" or "Headphones"
    pub kind: String,

    /// Hardware description from the trailing parenthesized segment,
    /// empty when the name has none
    pub hardware: String,
}

impl DeviceName {
    /// Split a raw device name into `{kind, hardware}`. Total: any input
    /// yields a result, names without a parenthesized suffix map to
    /// `{kind: raw, hardware: ""}`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_end();
        if let Some(stripped) = trimmed.strip_suffix(')') {
            if let Some(open) = stripped.rfind('(') {
                return Self {
                    kind: stripped[..open].trim().to_string(),
                    hardware: stripped[open + 1..].trim().to_string(),
                };
            }
        }
        Self {
            kind: raw.trim().to_string(),
            hardware: String::new(),
        }
    }
}

/// Device source adapter error types.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The external command failed to run or exited abnormally.
    #[error("Device command failed: {0}")]
    Command(String),

    /// The command ran but its output contained no parsable payload.
    #[error("Unreadable device list: {0}")]
    Parse(String),

    /// The command failed because the audio-control module is not installed.
    #[error("AudioDeviceCmdlets module is not installed")]
    DependencyMissing,
}

impl AdapterError {
    /// Classify a command failure message, promoting missing-module
    /// failures to their own kind so the caller can attempt remediation.
    pub fn from_command_failure(message: &str) -> Self {
        if is_dependency_missing(message) {
            AdapterError::DependencyMissing
        } else {
            AdapterError::Command(message.to_string())
        }
    }
}

/// True when a failure message indicates the AudioDeviceCmdlets module
/// is absent rather than a transient command error.
fn is_dependency_missing(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("audiodevicecmdlets")
        || (lower.contains("get-audiodevice") && lower.contains("not recognized"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_with_hardware_suffix() {
        let name = DeviceName::parse("Speakers (Realtek Audio)");
        assert_eq!(name.kind, "Speakers");
        assert_eq!(name.hardware, "Realtek Audio");
    }

    #[test]
    fn parse_name_without_suffix() {
        let name = DeviceName::parse("Headphones");
        assert_eq!(name.kind, "Headphones");
        assert_eq!(name.hardware, "");
    }

    #[test]
    fn parse_name_with_nested_parentheses() {
        let name = DeviceName::parse("Speakers (2- USB Audio (DAC))");
        assert_eq!(name.kind, "Speakers (2- USB Audio");
        assert_eq!(name.hardware, "DAC");
    }

    #[test]
    fn parse_name_empty() {
        let name = DeviceName::parse("");
        assert_eq!(name.kind, "");
        assert_eq!(name.hardware, "");
    }

    #[test]
    fn dependency_missing_detected_from_module_name() {
        let err = AdapterError::from_command_failure(
            "Import-Module : The specified module 'AudioDeviceCmdlets' was not loaded",
        );
        assert!(matches!(err, AdapterError::DependencyMissing));
    }

    #[test]
    fn dependency_missing_detected_from_unknown_cmdlet() {
        let err = AdapterError::from_command_failure(
            "The term 'Get-AudioDevice' is not recognized as the name of a cmdlet",
        );
        assert!(matches!(err, AdapterError::DependencyMissing));
    }

    #[test]
    fn plain_failure_stays_command_error() {
        let err = AdapterError::from_command_failure("access is denied");
        assert!(matches!(err, AdapterError::Command(_)));
    }
}
