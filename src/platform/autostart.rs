//! Windows startup registration.
//!
//! Adds or removes the per-user Run-key entry that starts the application
//! with Windows. The entry is keyed by a fixed application identifier and
//! points at the current executable.

use thiserror::Error;

/// Value name under the Run key.
pub const APP_NAME: &str = "AudioSwitcher";

#[derive(Debug, Error)]
pub enum AutostartError {
    #[error("Failed to access registry: {0}")]
    RegistryAccess(String),

    #[error("Failed to write startup entry")]
    WriteFailed,

    #[error("Startup registration is only supported on Windows")]
    Unsupported,
}

#[cfg(windows)]
mod imp {
    use super::{AutostartError, APP_NAME};
    use windows::core::PCWSTR;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_SZ,
    };

    const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Check whether the startup entry exists.
    pub fn is_enabled() -> bool {
        unsafe {
            let key_path = to_wide(RUN_KEY);
            let value_name = to_wide(APP_NAME);

            let mut hkey = HKEY::default();
            let result = RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_path.as_ptr()),
                0,
                KEY_READ,
                &mut hkey,
            );

            if result.is_err() {
                return false;
            }

            let mut data_size = 0u32;
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                None,
                None,
                Some(&mut data_size),
            );

            let _ = RegCloseKey(hkey);

            result.is_ok() && data_size > 0
        }
    }

    /// Write or delete the startup entry.
    pub fn set_enabled(enabled: bool) -> Result<(), AutostartError> {
        unsafe {
            let key_path = to_wide(RUN_KEY);
            let value_name = to_wide(APP_NAME);

            let mut hkey = HKEY::default();
            let result = RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_path.as_ptr()),
                0,
                KEY_WRITE,
                &mut hkey,
            );

            if result.is_err() {
                return Err(AutostartError::RegistryAccess(
                    "Failed to open Run key".to_string(),
                ));
            }

            let result = if enabled {
                let exe_path =
                    std::env::current_exe().map_err(|_| AutostartError::WriteFailed)?;
                let exe_path_wide = to_wide(&exe_path.to_string_lossy());

                RegSetValueExW(
                    hkey,
                    PCWSTR::from_raw(value_name.as_ptr()),
                    0,
                    REG_SZ,
                    Some(std::slice::from_raw_parts(
                        exe_path_wide.as_ptr() as *const u8,
                        exe_path_wide.len() * 2,
                    )),
                )
            } else {
                RegDeleteValueW(hkey, PCWSTR::from_raw(value_name.as_ptr()))
            };

            let _ = RegCloseKey(hkey);

            // Deleting an absent value is fine
            if result.is_err() && enabled {
                Err(AutostartError::WriteFailed)
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use super::AutostartError;
    use tracing::warn;

    pub fn is_enabled() -> bool {
        false
    }

    pub fn set_enabled(_enabled: bool) -> Result<(), AutostartError> {
        warn!("Startup registration skipped: not running on Windows");
        Err(AutostartError::Unsupported)
    }
}

pub use imp::{is_enabled, set_enabled};
