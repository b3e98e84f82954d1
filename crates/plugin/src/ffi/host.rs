//! Server callbacks handed over at load time

use std::ffi::{c_char, c_int, CString};
use std::time::{SystemTime, UNIX_EPOCH};

use urtadmin_core::Host;

/// Callback table the server passes to `urtadmin_load`.
///
/// Strings are NUL-terminated and only valid for the duration of the call.
/// A null entry disables that output.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HostCallbacks {
    /// Chat line to every client
    pub broadcast: Option<unsafe extern "C" fn(message: *const c_char)>,
    /// Chat line to one client slot
    pub send_to: Option<unsafe extern "C" fn(slot: c_int, message: *const c_char)>,
    /// Line appended to the server console buffer
    pub execute: Option<unsafe extern "C" fn(command: *const c_char)>,
    /// Seconds since the Unix epoch; the system clock is used when null
    pub now: Option<unsafe extern "C" fn() -> i64>,
}

/// [`Host`] implemented over a [`HostCallbacks`] table
#[derive(Debug)]
pub struct FfiHost {
    callbacks: HostCallbacks,
}

impl FfiHost {
    pub fn new(callbacks: HostCallbacks) -> Self {
        Self { callbacks }
    }
}

/// Chat text and player names may carry stray NULs; drop them
fn to_c_string(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

impl Host for FfiHost {
    fn broadcast(&self, message: &str) {
        if let Some(broadcast) = self.callbacks.broadcast {
            let message = to_c_string(message);
            // SAFETY: the server keeps the callback valid while loaded and the
            // string outlives the call
            unsafe { broadcast(message.as_ptr()) };
        }
    }

    fn send_to(&self, slot: usize, message: &str) {
        let (Some(send_to), Ok(slot)) = (self.callbacks.send_to, c_int::try_from(slot)) else {
            return;
        };
        let message = to_c_string(message);
        // SAFETY: as above
        unsafe { send_to(slot, message.as_ptr()) };
    }

    fn execute(&self, command: &str) {
        if let Some(execute) = self.callbacks.execute {
            let command = to_c_string(command);
            // SAFETY: as above
            unsafe { execute(command.as_ptr()) };
        }
    }

    fn now(&self) -> i64 {
        match self.callbacks.now {
            // SAFETY: the server keeps the callback valid while loaded
            Some(now) => unsafe { now() },
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::sync::Mutex;

    use super::*;

    static SEEN: Mutex<Vec<String>> = Mutex::new(Vec::new());

    unsafe extern "C" fn record_execute(command: *const c_char) {
        let command = CStr::from_ptr(command).to_string_lossy().into_owned();
        SEEN.lock().unwrap().push(command);
    }

    unsafe extern "C" fn fixed_now() -> i64 {
        42
    }

    #[test]
    fn test_callbacks_are_forwarded() {
        let host = FfiHost::new(HostCallbacks {
            broadcast: None,
            send_to: None,
            execute: Some(record_execute),
            now: Some(fixed_now),
        });

        host.execute("kick 3");
        host.execute("say a\0b");
        host.broadcast("nobody listens");

        assert_eq!(*SEEN.lock().unwrap(), vec!["kick 3", "say ab"]);
        assert_eq!(host.now(), 42);
    }

    #[test]
    fn test_missing_clock_uses_system_time() {
        let host = FfiHost::new(HostCallbacks {
            broadcast: None,
            send_to: None,
            execute: None,
            now: None,
        });
        assert!(host.now() > 1_600_000_000);
    }
}
