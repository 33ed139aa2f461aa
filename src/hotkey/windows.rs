//! `WH_KEYBOARD_LL` hook
//!
//! Low-level keyboard hooks are called on the thread that installed them, and
//! only while that thread pumps messages. The hook therefore lives on its own
//! thread with a bare message loop; uninstalling posts `WM_QUIT` to it.

use std::ffi::c_void;
use std::io;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};
use windows_sys::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::System::Threading::GetCurrentThreadId;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT, MSG,
    PM_NOREMOVE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_QUIT, WM_USER,
};

use super::{HookDecision, HookError, HookToken, Key, KeyEvent, KeyHandler, KeyboardHook};

static HOOK: AtomicPtr<c_void> = AtomicPtr::new(ptr::null_mut());
static HANDLER: Mutex<Option<KeyHandler>> = Mutex::new(None);

unsafe extern "system" fn keyboard_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let hook = HOOK.load(Ordering::SeqCst);

    if code == HC_ACTION as i32 && wparam as u32 == WM_KEYDOWN {
        let info = &*(lparam as *const KBDLLHOOKSTRUCT);
        let event = KeyEvent::down(Key::from_virtual_key(info.vkCode));

        let decision = match HANDLER.lock() {
            Ok(handler) => handler.as_ref().map(|handler| handler(event)),
            Err(_) => None,
        };
        if decision == Some(HookDecision::Consume) {
            return 1;
        }
    }

    CallNextHookEx(hook, code, wparam, lparam)
}

fn set_handler(handler: Option<KeyHandler>) {
    match HANDLER.lock() {
        Ok(mut slot) => *slot = handler,
        Err(poisoned) => *poisoned.into_inner() = handler,
    }
}

/// Body of the hook thread: install, report, pump messages, unhook
fn run_hook_thread(ready: Sender<Result<u32, HookError>>) {
    unsafe {
        let module = GetModuleHandleW(ptr::null());
        let hook = SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), module, 0);
        if hook.is_null() {
            let error = io::Error::last_os_error();
            let _ = ready.send(Err(HookError::Install(error.to_string())));
            return;
        }
        HOOK.store(hook, Ordering::SeqCst);

        // Create the thread's message queue before anyone posts WM_QUIT to it
        let mut msg: MSG = std::mem::zeroed();
        PeekMessageW(&mut msg, ptr::null_mut(), WM_USER, WM_USER, PM_NOREMOVE);

        let _ = ready.send(Ok(GetCurrentThreadId()));

        while GetMessageW(&mut msg, ptr::null_mut(), 0, 0) > 0 {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        if UnhookWindowsHookEx(hook) == 0 {
            warn!("UnhookWindowsHookEx failed: {}", io::Error::last_os_error());
        }
        HOOK.store(ptr::null_mut(), Ordering::SeqCst);
        debug!("Keyboard hook thread exiting");
    }
}

/// Process-wide low-level keyboard hook
#[derive(Default)]
pub struct LowLevelKeyboardHook {
    thread: Option<JoinHandle<()>>,
}

impl KeyboardHook for LowLevelKeyboardHook {
    fn install(&mut self, handler: KeyHandler) -> Result<HookToken, HookError> {
        if self.thread.is_some() || !HOOK.load(Ordering::SeqCst).is_null() {
            return Err(HookError::AlreadyInstalled);
        }
        set_handler(Some(handler));

        let (ready_tx, ready_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("keyboard-hook".to_string())
            .spawn(move || run_hook_thread(ready_tx))
            .map_err(|e| HookError::Install(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.thread = Some(thread);
                Ok(HookToken::new(u64::from(thread_id)))
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                set_handler(None);
                Err(e)
            }
            Err(_) => {
                set_handler(None);
                Err(HookError::Install("hook thread exited early".to_string()))
            }
        }
    }

    fn uninstall(&mut self, token: HookToken) -> Result<(), HookError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        let thread_id = token.id() as u32;
        let posted = unsafe { PostThreadMessageW(thread_id, WM_QUIT, 0, 0) };
        if posted == 0 {
            let error = io::Error::last_os_error();
            self.thread = Some(thread);
            return Err(HookError::Uninstall(error.to_string()));
        }

        let joined = thread.join();
        set_handler(None);
        joined.map_err(|_| HookError::Uninstall("hook thread panicked".to_string()))
    }
}
