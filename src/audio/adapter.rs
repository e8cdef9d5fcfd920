//! Device source adapter.
//!
//! Enumerates and switches playback devices by invoking PowerShell with the
//! AudioDeviceCmdlets module. The commands are slow and may block for seconds,
//! so every public operation runs on a detached worker thread and reports its
//! result as an [`AdapterEvent`] on the adapter's channel. Events arrive in
//! completion order, not call order.

use std::process::Command;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::device::{AdapterError, PlaybackDevice};

/// Upper bound on a dependency installation attempt. A result arriving
/// after this deadline is discarded by the caller.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(90);

/// PowerShell pipeline that lists playback devices as compact JSON.
/// Errors are folded into the payload so a cmdlet failure still produces
/// one parsable object on stdout.
const LIST_COMMAND: &str = "\
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; \
$ErrorActionPreference = 'Stop'; \
try { \
  Import-Module AudioDeviceCmdlets -ErrorAction Stop; \
  $devices = Get-AudioDevice -List | Where-Object { $_.Type -eq 'Playback' }; \
  $default = Get-AudioDevice -Playback; \
  $result = @{ devices = @($devices | ForEach-Object { @{ id = $_.ID; name = $_.Name; isDefault = ($_.ID -eq $default.ID) } }) }; \
  ConvertTo-Json $result -Compress -Depth 5 \
} catch { \
  Write-Output ('{\"devices\":[],\"error\":\"' + $_.Exception.Message.Replace('\"', \"'\").Replace('\\', '/') + '\"}') \
}";

const INSTALL_COMMAND: &str = "\
$ErrorActionPreference = 'Stop'; \
Install-Module -Name AudioDeviceCmdlets -Force -Scope CurrentUser -AllowClobber; \
Write-Output 'OK'";

/// Completion events delivered on the adapter channel.
#[derive(Debug)]
pub enum AdapterEvent {
    /// A device enumeration finished.
    FetchCompleted(Result<Vec<PlaybackDevice>, AdapterError>),

    /// A switch-default-device command finished.
    SwitchCompleted {
        device_id: String,
        result: Result<(), AdapterError>,
    },

    /// A dependency installation attempt finished.
    InstallCompleted(Result<(), AdapterError>),
}

/// Handle for launching device commands. Cheap to clone the inner sender;
/// results fan back into the single channel the app drains every frame.
pub struct DeviceCommands {
    events: Sender<AdapterEvent>,
}

impl DeviceCommands {
    pub fn new(events: Sender<AdapterEvent>) -> Self {
        Self { events }
    }

    /// Enumerate playback devices on a worker thread.
    pub fn spawn_fetch(&self) {
        let events = self.events.clone();
        thread::spawn(move || {
            let result = run_fetch();
            // Receiver gone means the app is shutting down
            let _ = events.send(AdapterEvent::FetchCompleted(result));
        });
    }

    /// Make `device_id` the default playback device, on a worker thread.
    pub fn spawn_switch(&self, device_id: String) {
        let events = self.events.clone();
        thread::spawn(move || {
            let result = run_switch(&device_id);
            let _ = events.send(AdapterEvent::SwitchCompleted { device_id, result });
        });
    }

    /// Install the AudioDeviceCmdlets module, on a worker thread. The
    /// caller enforces [`INSTALL_TIMEOUT`]; the thread itself is never
    /// cancelled once started.
    pub fn spawn_install(&self) {
        let events = self.events.clone();
        thread::spawn(move || {
            info!("Installing AudioDeviceCmdlets module");
            let result = run_powershell(INSTALL_COMMAND).map(|_| ());
            let _ = events.send(AdapterEvent::InstallCompleted(result));
        });
    }
}

fn run_fetch() -> Result<Vec<PlaybackDevice>, AdapterError> {
    let stdout = run_powershell(LIST_COMMAND)?;
    let devices = parse_device_list(&stdout)?;
    debug!(count = devices.len(), "Fetched playback devices");
    Ok(devices)
}

fn run_switch(device_id: &str) -> Result<(), AdapterError> {
    // Single quotes in PowerShell string literals are escaped by doubling
    let escaped = device_id.replace('\'', "''");
    let command = format!(
        "$ErrorActionPreference = 'Stop'; \
         Import-Module AudioDeviceCmdlets -ErrorAction Stop; \
         Set-AudioDevice -ID '{escaped}'; \
         Write-Output 'OK'"
    );
    run_powershell(&command)?;
    Ok(())
}

/// Run a PowerShell command and return its stdout, classifying failures.
fn run_powershell(command: &str) -> Result<String, AdapterError> {
    let mut cmd = Command::new("powershell.exe");
    cmd.args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", command]);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    let output = cmd
        .output()
        .map_err(|e| AdapterError::Command(format!("failed to run powershell: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            format!("powershell exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        warn!(status = %output.status, "Device command failed");
        return Err(AdapterError::from_command_failure(&message));
    }

    Ok(stdout)
}

#[derive(Deserialize)]
struct DeviceListPayload {
    #[serde(default)]
    devices: Vec<PlaybackDevice>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse the enumeration output. PowerShell surrounds the payload with
/// module banners and progress noise, so the first balanced JSON object is
/// extracted before deserializing.
pub fn parse_device_list(raw: &str) -> Result<Vec<PlaybackDevice>, AdapterError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| AdapterError::Parse("no JSON object in command output".to_string()))?;

    let payload: DeviceListPayload = serde_json::from_str(json)
        .map_err(|e| AdapterError::Parse(format!("malformed device list: {e}")))?;

    if let Some(message) = payload.error {
        return Err(AdapterError::from_command_failure(&message));
    }

    Ok(payload.devices)
}

/// Extract the first balanced `{...}` object from `raw`, honoring JSON
/// string literals and escapes so braces inside device names don't
/// unbalance the scan.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_noisy_output() {
        let raw = "WARNING: loading module...\r\n{\"devices\":[]}\r\nDone.";
        assert_eq!(extract_json_object(raw), Some("{\"devices\":[]}"));
    }

    #[test]
    fn extracts_first_of_multiple_objects() {
        let raw = "{\"a\":1} {\"b\":2}";
        assert_eq!(extract_json_object(raw), Some("{\"a\":1}"));
    }

    #[test]
    fn extraction_ignores_braces_inside_strings() {
        let raw = "junk {\"name\":\"weird } device {\",\"n\":{\"x\":1}} tail";
        assert_eq!(
            extract_json_object(raw),
            Some("{\"name\":\"weird } device {\",\"n\":{\"x\":1}}")
        );
    }

    #[test]
    fn extraction_fails_on_unbalanced_output() {
        assert_eq!(extract_json_object("{\"devices\":["), None);
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn parses_device_list() {
        let raw = r#"{"devices":[{"id":"{0.0.0}.{abc}","name":"Speakers (Realtek Audio)","isDefault":true},{"id":"{0.0.0}.{def}","name":"Headphones","isDefault":false}]}"#;
        let devices = parse_device_list(raw).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "{0.0.0}.{abc}");
        assert!(devices[0].is_default);
        assert_eq!(devices[1].name, "Headphones");
        assert!(!devices[1].is_default);
    }

    #[test]
    fn parse_failure_is_distinct_from_command_failure() {
        let err = parse_device_list("PS banner text only").unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));

        let err = parse_device_list("{\"devices\":[{\"id\":3}]}").unwrap_err();
        assert!(matches!(err, AdapterError::Parse(_)));
    }

    #[test]
    fn embedded_error_field_becomes_command_error() {
        let raw = r#"{"devices":[],"error":"access denied"}"#;
        let err = parse_device_list(raw).unwrap_err();
        assert!(matches!(err, AdapterError::Command(_)));
    }

    #[test]
    fn embedded_missing_module_error_is_classified() {
        let raw = r#"{"devices":[],"error":"The specified module 'AudioDeviceCmdlets' was not loaded"}"#;
        let err = parse_device_list(raw).unwrap_err();
        assert!(matches!(err, AdapterError::DependencyMissing));
    }
}
