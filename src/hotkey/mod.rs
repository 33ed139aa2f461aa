//! System-wide function-key hotkeys
//!
//! The platform hook only decodes raw key events and asks a handler whether
//! to swallow them; all of the decision logic lives in [`HotkeyBridge`], which
//! never blocks and hands every action to the interactive loop through its
//! event channel.

mod bridge;
#[cfg(windows)]
mod windows;

pub use bridge::HotkeyBridge;

use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Keys the panel cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    /// F1..F24
    Function(u8),
    /// Any other key, by platform key code
    Other(u32),
}

impl Key {
    /// Decode a Windows virtual-key code
    pub fn from_virtual_key(code: u32) -> Self {
        match code {
            0x1B => Key::Escape,
            0x70..=0x87 => Key::Function((code - 0x70 + 1) as u8),
            other => Key::Other(other),
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("escape") || name.eq_ignore_ascii_case("esc") {
            return Ok(Key::Escape);
        }
        if let Some(number) = name.strip_prefix(['F', 'f']) {
            if let Ok(n @ 1..=24) = number.parse::<u8>() {
                return Ok(Key::Function(n));
            }
        }
        Err(format!("unknown key '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Down,
    Up,
}

/// A decoded keyboard event delivered by the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Down,
        }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Up,
        }
    }
}

/// What the hook should do with an event after the handler has seen it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Swallow the event; no other window or hook sees it
    Consume,
    /// Forward the event to the next hook in the chain
    PassThrough,
}

/// Callback run for every key event, on the hook's own thread
pub type KeyHandler = Box<dyn Fn(KeyEvent) -> HookDecision + Send + Sync + 'static>;

/// Opaque handle for an installed hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookToken(u64);

impl HookToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("global keyboard hooks are not supported on this platform")]
    Unsupported,
    #[error("keyboard hook is already installed")]
    AlreadyInstalled,
    #[error("failed to install keyboard hook: {0}")]
    Install(String),
    #[error("failed to remove keyboard hook: {0}")]
    Uninstall(String),
}

/// A process-wide keyboard interceptor
pub trait KeyboardHook: Send {
    fn install(&mut self, handler: KeyHandler) -> Result<HookToken, HookError>;
    fn uninstall(&mut self, token: HookToken) -> Result<(), HookError>;
}

/// Hook for platforms without a low-level keyboard interceptor
#[derive(Debug, Default)]
pub struct UnsupportedHook;

impl KeyboardHook for UnsupportedHook {
    fn install(&mut self, _handler: KeyHandler) -> Result<HookToken, HookError> {
        Err(HookError::Unsupported)
    }

    fn uninstall(&mut self, _token: HookToken) -> Result<(), HookError> {
        Ok(())
    }
}

/// The keyboard hook for the current platform
#[cfg(windows)]
pub fn platform_hook() -> Box<dyn KeyboardHook> {
    Box::new(windows::LowLevelKeyboardHook::default())
}

#[cfg(not(windows))]
pub fn platform_hook() -> Box<dyn KeyboardHook> {
    Box::new(UnsupportedHook)
}

/// An installed hook, removed exactly once by [`release`](Self::release) or drop
pub struct HotkeyRegistration {
    hook: Box<dyn KeyboardHook>,
    token: Option<HookToken>,
}

impl HotkeyRegistration {
    /// Install `hook` with the bridge as its handler
    pub fn install(
        mut hook: Box<dyn KeyboardHook>,
        bridge: HotkeyBridge,
    ) -> Result<Self, HookError> {
        let handler: KeyHandler = Box::new(move |event| bridge.decide(event));
        let token = hook.install(handler)?;
        info!("Keyboard hook installed");
        Ok(Self {
            hook,
            token: Some(token),
        })
    }

    pub fn is_installed(&self) -> bool {
        self.token.is_some()
    }

    /// Remove the hook; later calls do nothing
    pub fn release(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        match self.hook.uninstall(token) {
            Ok(()) => info!("Keyboard hook removed"),
            Err(e) => warn!("{}", e),
        }
    }
}

impl Drop for HotkeyRegistration {
    fn drop(&mut self) {
        if self.is_installed() {
            debug!("Releasing keyboard hook on drop");
        }
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PanelEvent;
    use crate::state::PanelSnapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    /// Hook double that keeps the handler so tests can feed it events
    #[derive(Default, Clone)]
    struct RecordingHook {
        handler: Arc<Mutex<Option<KeyHandler>>>,
        uninstalls: Arc<AtomicUsize>,
    }

    impl RecordingHook {
        fn press(&self, key: Key) -> Option<HookDecision> {
            let handler = self.handler.lock().unwrap();
            handler.as_ref().map(|handler| handler(KeyEvent::down(key)))
        }
    }

    impl KeyboardHook for RecordingHook {
        fn install(&mut self, handler: KeyHandler) -> Result<HookToken, HookError> {
            *self.handler.lock().unwrap() = Some(handler);
            Ok(HookToken::new(7))
        }

        fn uninstall(&mut self, token: HookToken) -> Result<(), HookError> {
            assert_eq!(token.id(), 7);
            self.handler.lock().unwrap().take();
            self.uninstalls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("Escape".parse::<Key>(), Ok(Key::Escape));
        assert_eq!("esc".parse::<Key>(), Ok(Key::Escape));
        assert_eq!("F1".parse::<Key>(), Ok(Key::Function(1)));
        assert_eq!("f12".parse::<Key>(), Ok(Key::Function(12)));
        assert!("F25".parse::<Key>().is_err());
        assert!("F0".parse::<Key>().is_err());
        assert!("Space".parse::<Key>().is_err());
    }

    #[test]
    fn test_virtual_key_decoding() {
        assert_eq!(Key::from_virtual_key(0x1B), Key::Escape);
        assert_eq!(Key::from_virtual_key(0x70), Key::Function(1));
        assert_eq!(Key::from_virtual_key(0x7B), Key::Function(12));
        assert_eq!(Key::from_virtual_key(0x87), Key::Function(24));
        assert_eq!(Key::from_virtual_key(0x41), Key::Other(0x41));
    }

    #[test]
    fn test_unsupported_hook_fails_install() {
        let (tx, _rx) = mpsc::unbounded_channel::<PanelEvent>();
        let bridge = HotkeyBridge::new(Arc::new(PanelSnapshot::new(10, true)), tx, Key::Escape, 12);
        let result = HotkeyRegistration::install(Box::new(UnsupportedHook), bridge);
        assert!(matches!(result, Err(HookError::Unsupported)));
    }

    #[test]
    fn test_registration_routes_events_and_releases_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bridge = HotkeyBridge::new(Arc::new(PanelSnapshot::new(10, false)), tx, Key::Escape, 12);
        let hook = RecordingHook::default();
        let probe = hook.clone();

        let mut registration = HotkeyRegistration::install(Box::new(hook), bridge).unwrap();
        assert!(registration.is_installed());

        assert_eq!(probe.press(Key::Function(2)), Some(HookDecision::Consume));
        assert!(matches!(rx.try_recv(), Ok(PanelEvent::ClickSlot(1))));

        registration.release();
        registration.release();
        drop(registration);
        assert_eq!(probe.uninstalls.load(Ordering::SeqCst), 1);
        assert_eq!(probe.press(Key::Function(2)), None);
    }

    #[test]
    fn test_drop_releases_hook() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let bridge = HotkeyBridge::new(Arc::new(PanelSnapshot::new(1, false)), tx, Key::Escape, 12);
        let hook = RecordingHook::default();
        let probe = hook.clone();

        let registration = HotkeyRegistration::install(Box::new(hook), bridge).unwrap();
        drop(registration);
        assert_eq!(probe.uninstalls.load(Ordering::SeqCst), 1);
    }
}
