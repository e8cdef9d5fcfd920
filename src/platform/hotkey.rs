//! Global hotkey registration.
//!
//! Parses `Modifier+...+Key` hotkey strings and binds the result as a
//! system-wide hotkey. Registration happens on a dedicated listener thread
//! that owns a Win32 message loop; presses are forwarded over an mpsc
//! channel drained by the UI thread. Exactly one hotkey is active at a
//! time: registering always tears the previous listener down first.

use std::sync::mpsc::Sender;

use thiserror::Error;

/// Fired on the events channel when the registered hotkey is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyPressed;

#[derive(Debug, Error)]
pub enum HotkeyError {
    #[error("Invalid hotkey string '{input}': {reason}")]
    Parse { input: String, reason: String },

    #[error("Failed to register hotkey: {0}")]
    Registration(String),

    #[error("Global hotkeys are only supported on Windows")]
    Unsupported,
}

/// Non-modifier part of a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyKey {
    /// An ASCII letter, stored uppercase
    Letter(char),
    /// A digit 0-9
    Digit(u8),
    /// F1-F24
    Function(u8),
}

/// A parsed hotkey: modifier flags plus one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeySpec {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
    pub key: HotkeyKey,
}

impl HotkeySpec {
    /// Parse strings like `Alt+A`, `Ctrl+Shift+F9`, `Win+5`. Modifier
    /// names are case-insensitive; the key must be a letter, digit, or
    /// `F1`-`F24`, and appear exactly once.
    pub fn parse(input: &str) -> Result<Self, HotkeyError> {
        let parse_err = |reason: &str| HotkeyError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut spec = Self {
            ctrl: false,
            alt: false,
            shift: false,
            win: false,
            key: HotkeyKey::Letter('A'),
        };
        let mut key = None;

        for part in input.split('+') {
            let part = part.trim();
            match part.to_lowercase().as_str() {
                "" => return Err(parse_err("empty segment")),
                "ctrl" | "control" | "cmdorctrl" | "commandorcontrol" => spec.ctrl = true,
                "alt" => spec.alt = true,
                "shift" => spec.shift = true,
                "win" | "super" | "meta" => spec.win = true,
                _ => {
                    if key.is_some() {
                        return Err(parse_err("more than one key"));
                    }
                    key = Some(parse_key(part).ok_or_else(|| parse_err("unknown key"))?);
                }
            }
        }

        spec.key = key.ok_or_else(|| parse_err("no key"))?;
        Ok(spec)
    }
}

fn parse_key(part: &str) -> Option<HotkeyKey> {
    let mut chars = part.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => {
            Some(HotkeyKey::Letter(c.to_ascii_uppercase()))
        }
        (Some(c), None) if c.is_ascii_digit() => Some(HotkeyKey::Digit(c as u8 - b'0')),
        (Some('F' | 'f'), Some(_)) => {
            let n: u8 = part[1..].parse().ok()?;
            (1..=24).contains(&n).then_some(HotkeyKey::Function(n))
        }
        _ => None,
    }
}

/// Owns the active listener, if any. Dropping the manager unregisters.
pub struct HotkeyManager {
    events: Sender<HotkeyPressed>,
    listener: Option<imp::Listener>,
}

impl HotkeyManager {
    pub fn new(events: Sender<HotkeyPressed>) -> Self {
        Self {
            events,
            listener: None,
        }
    }

    /// Register `input` as the global hotkey, replacing any previous one.
    /// On failure the previous binding is already gone and no hotkey is
    /// active; the caller logs and continues.
    pub fn register(&mut self, input: &str) -> Result<(), HotkeyError> {
        self.unregister_all();
        let spec = HotkeySpec::parse(input)?;
        self.listener = Some(imp::spawn(spec, self.events.clone())?);
        Ok(())
    }

    /// Tear down the active binding, if any.
    pub fn unregister_all(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

#[cfg(windows)]
mod imp {
    use super::{HotkeyError, HotkeyKey, HotkeyPressed, HotkeySpec};
    use std::sync::mpsc::{channel, Sender};
    use std::thread::JoinHandle;
    use tracing::{info, warn};
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::System::Threading::GetCurrentThreadId;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT,
        MOD_SHIFT, MOD_WIN,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetMessageW, PostThreadMessageW, MSG, WM_HOTKEY, WM_QUIT,
    };

    const HOTKEY_ID: i32 = 1;

    pub struct Listener {
        thread_id: u32,
        handle: JoinHandle<()>,
    }

    impl Listener {
        pub fn stop(self) {
            unsafe {
                let _ = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
            let _ = self.handle.join();
        }
    }

    fn to_win32(spec: &HotkeySpec) -> (HOT_KEY_MODIFIERS, u32) {
        let mut mods = MOD_NOREPEAT;
        if spec.ctrl {
            mods |= MOD_CONTROL;
        }
        if spec.alt {
            mods |= MOD_ALT;
        }
        if spec.shift {
            mods |= MOD_SHIFT;
        }
        if spec.win {
            mods |= MOD_WIN;
        }
        let vk = match spec.key {
            HotkeyKey::Letter(c) => c as u32,
            HotkeyKey::Digit(d) => u32::from(b'0' + d),
            HotkeyKey::Function(n) => 0x6F + u32::from(n),
        };
        (mods, vk)
    }

    /// Spawn the listener thread. The thread registers the hotkey, reports
    /// the outcome through a handshake channel, then pumps its message
    /// queue until a WM_QUIT from [`Listener::stop`].
    pub fn spawn(
        spec: HotkeySpec,
        events: Sender<HotkeyPressed>,
    ) -> Result<Listener, HotkeyError> {
        let (ready_tx, ready_rx) = channel();

        let handle = std::thread::spawn(move || unsafe {
            let thread_id = GetCurrentThreadId();
            let (mods, vk) = to_win32(&spec);

            if let Err(e) = RegisterHotKey(None, HOTKEY_ID, mods, vk) {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
            let _ = ready_tx.send(Ok(thread_id));
            info!(vk, "Global hotkey registered");

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                if msg.message == WM_HOTKEY && events.send(HotkeyPressed).is_err() {
                    break;
                }
            }

            let _ = UnregisterHotKey(None, HOTKEY_ID);
        });

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Listener { thread_id, handle }),
            Ok(Err(message)) => {
                let _ = handle.join();
                warn!(error = %message, "Hotkey registration failed");
                Err(HotkeyError::Registration(message))
            }
            Err(_) => {
                let _ = handle.join();
                Err(HotkeyError::Registration(
                    "listener thread exited before registering".to_string(),
                ))
            }
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use super::{HotkeyError, HotkeyPressed, HotkeySpec};
    use std::sync::mpsc::Sender;
    use tracing::warn;

    pub struct Listener;

    impl Listener {
        pub fn stop(self) {}
    }

    pub fn spawn(
        _spec: HotkeySpec,
        _events: Sender<HotkeyPressed>,
    ) -> Result<Listener, HotkeyError> {
        warn!("Global hotkey skipped: not running on Windows");
        Err(HotkeyError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_binding() {
        let spec = HotkeySpec::parse("Alt+A").unwrap();
        assert!(spec.alt && !spec.ctrl && !spec.shift && !spec.win);
        assert_eq!(spec.key, HotkeyKey::Letter('A'));
    }

    #[test]
    fn parses_multiple_modifiers_case_insensitively() {
        let spec = HotkeySpec::parse("ctrl+SHIFT+f9").unwrap();
        assert!(spec.ctrl && spec.shift && !spec.alt);
        assert_eq!(spec.key, HotkeyKey::Function(9));
    }

    #[test]
    fn parses_digit_and_win_aliases() {
        let spec = HotkeySpec::parse("Super+5").unwrap();
        assert!(spec.win);
        assert_eq!(spec.key, HotkeyKey::Digit(5));
    }

    #[test]
    fn lowercase_letter_is_normalized() {
        let spec = HotkeySpec::parse("Alt+a").unwrap();
        assert_eq!(spec.key, HotkeyKey::Letter('A'));
    }

    #[test]
    fn rejects_missing_key() {
        assert!(HotkeySpec::parse("Ctrl+Alt").is_err());
        assert!(HotkeySpec::parse("").is_err());
    }

    #[test]
    fn rejects_trailing_separator() {
        assert!(HotkeySpec::parse("Alt+").is_err());
    }

    #[test]
    fn rejects_two_keys() {
        assert!(HotkeySpec::parse("Alt+A+B").is_err());
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(HotkeySpec::parse("Hyper+A").is_err());
        assert!(HotkeySpec::parse("Alt+F25").is_err());
        assert!(HotkeySpec::parse("Alt+AB").is_err());
    }
}
