//! C-compatible exports called by the game server
//!
//! The server calls these from its frame thread. The core lives in a global
//! behind a mutex; every export other than `urtadmin_load` is a no-op while
//! nothing is loaded.

use std::ffi::{c_char, c_int, CStr};
use std::path::PathBuf;
use std::sync::LazyLock;

use parking_lot::Mutex;
use tracing::instrument;

use urtadmin_core::{AdminCore, CommandResult, ConnectionState, CoreConfig, Team};

use super::host::{FfiHost, HostCallbacks};

static CORE: LazyLock<Mutex<Option<AdminCore>>> = LazyLock::new(|| Mutex::new(None));

/// Borrow a C string, `""` for null or invalid UTF-8
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string that outlives `'a`
unsafe fn c_str<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "";
    }
    CStr::from_ptr(ptr).to_str().unwrap_or("")
}

fn slot_index(slot: c_int) -> Option<usize> {
    usize::try_from(slot).ok()
}

/// Run `f` against the loaded core
fn with_core<T>(f: impl FnOnce(&mut AdminCore) -> T) -> Option<T> {
    let mut guard = CORE.lock();
    match guard.as_mut() {
        Some(core) => Some(f(core)),
        None => {
            tracing::warn!("urtadmin is not loaded");
            None
        }
    }
}

/// Load config, level table and database from `base_dir` and start serving.
///
/// Returns false when loading failed; the reason is logged.
///
/// A null or empty `base_dir` falls back to the directory of the server
/// executable.
///
/// # Safety
/// - `base_dir` must be null or a valid NUL-terminated path
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn urtadmin_load(
    base_dir: *const c_char,
    max_clients: c_int,
    callbacks: HostCallbacks,
) -> bool {
    let base_dir = match c_str(base_dir) {
        "" => match urtadmin_core::config::default_base_dir() {
            Ok(dir) => dir,
            Err(e) => {
                crate::init_logging(false);
                tracing::error!("No base directory given: {}", e);
                return false;
            }
        },
        dir => PathBuf::from(dir),
    };
    let debug = CoreConfig::load_from(&base_dir)
        .map(|config| config.debug)
        .unwrap_or(false);
    crate::init_logging(debug);

    tracing::info!(base_dir = %base_dir.display(), "urtadmin loading...");

    let Some(max_clients) = usize::try_from(max_clients).ok().filter(|n| *n > 0) else {
        tracing::error!(max_clients, "Invalid client count");
        return false;
    };

    match AdminCore::load(base_dir, max_clients, Box::new(FfiHost::new(callbacks))) {
        Ok(core) => {
            tracing::info!(actions = core.commands().len(), "urtadmin loaded");
            *CORE.lock() = Some(core);
            true
        }
        Err(e) => {
            tracing::error!("Failed to load urtadmin: {}", e);
            false
        }
    }
}

/// Stop the store worker and drop the core
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn urtadmin_unload() -> bool {
    tracing::info!("urtadmin unloading...");

    let result = std::panic::catch_unwind(|| {
        if let Some(mut core) = CORE.lock().take() {
            core.shutdown();
        }
    });
    result.is_ok()
}

/// A client finished connecting
///
/// # Safety
/// - `name`, `guid` and `ip` must be valid NUL-terminated strings or null
#[no_mangle]
#[instrument(skip_all, fields(slot = slot))]
pub unsafe extern "C" fn urtadmin_client_connect(
    slot: c_int,
    name: *const c_char,
    guid: *const c_char,
    ip: *const c_char,
) {
    let Some(slot) = slot_index(slot) else {
        return;
    };
    let (name, guid, ip) = (c_str(name), c_str(guid), c_str(ip));

    with_core(|core| {
        if let Err(e) = core.client_connected(slot, name, guid, ip) {
            tracing::error!(slot, "Connect handling failed: {}", e);
        }
    });
}

/// A client's userinfo changed. `team` is the engine team index, negative
/// when unknown.
///
/// # Safety
/// - `name` must be a valid NUL-terminated string or null
#[no_mangle]
#[instrument(skip_all, fields(slot = slot))]
pub unsafe extern "C" fn urtadmin_userinfo_changed(slot: c_int, name: *const c_char, team: c_int) {
    let Some(slot) = slot_index(slot) else {
        return;
    };
    let name = c_str(name);
    let team = (team >= 0).then(|| Team::from_index(team));

    with_core(|core| {
        if let Err(e) = core.userinfo_changed(slot, name, team) {
            tracing::error!(slot, "Userinfo handling failed: {}", e);
        }
    });
}

#[no_mangle]
#[instrument(skip_all, fields(slot = slot))]
pub extern "C" fn urtadmin_client_disconnect(slot: c_int) {
    let Some(slot) = slot_index(slot) else {
        return;
    };
    with_core(|core| core.client_disconnected(slot));
}

/// The engine moved `slot` to another connection state (0 free, 1 zombie,
/// 2 connected, 3 primed, 4 active). Free closes the session.
#[no_mangle]
#[instrument(skip_all, fields(slot = slot))]
pub extern "C" fn urtadmin_client_state(slot: c_int, state: c_int) {
    let Some(slot) = slot_index(slot) else {
        return;
    };
    let state = ConnectionState::from_index(state);
    with_core(|core| core.client_state_changed(slot, state));
}

/// A chat line from `slot`. Returns true when the line was an admin action
/// and must not be shown in chat.
///
/// # Safety
/// - `text` must be a valid NUL-terminated string or null
#[no_mangle]
#[instrument(skip_all, fields(slot = slot))]
pub unsafe extern "C" fn urtadmin_chat(slot: c_int, text: *const c_char) -> bool {
    let Some(slot) = slot_index(slot) else {
        return false;
    };
    let text = c_str(text);

    with_core(|core| core.chat_command(slot, text) == CommandResult::Handled).unwrap_or(false)
}

/// Console `setlevel <handle> <level>`. Returns false when the level was not
/// changed; the reason is logged.
///
/// # Safety
/// - `handle` must be a valid NUL-terminated string or null
#[no_mangle]
#[instrument(skip_all)]
pub unsafe extern "C" fn urtadmin_console_setlevel(handle: *const c_char, level: c_int) -> bool {
    let handle = c_str(handle);

    with_core(|core| match core.console_setlevel(handle, level) {
        Ok(target) => {
            tracing::info!("{} is now level {}", target.name, level);
            true
        }
        Err(e) => {
            tracing::warn!(handle, level, "setlevel failed: {}", e);
            false
        }
    })
    .unwrap_or(false)
}

/// Re-read the command level file
#[no_mangle]
#[instrument(skip_all)]
pub extern "C" fn urtadmin_reload_levels() -> bool {
    with_core(|core| match core.reload_levels() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to reload command levels: {}", e);
            false
        }
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;
    use std::sync::Mutex as StdMutex;

    use super::*;

    static EXECUTED: StdMutex<Vec<String>> = StdMutex::new(Vec::new());

    unsafe extern "C" fn record_execute(command: *const c_char) {
        let command = CStr::from_ptr(command).to_string_lossy().into_owned();
        EXECUTED.lock().unwrap().push(command);
    }

    fn callbacks() -> HostCallbacks {
        HostCallbacks {
            broadcast: None,
            send_to: None,
            execute: Some(record_execute),
            now: None,
        }
    }

    #[test]
    fn test_lifecycle_through_c_abi() {
        assert!(!urtadmin_reload_levels(), "nothing loaded yet");

        let dir = tempfile::tempdir().unwrap();
        let base = CString::new(dir.path().to_string_lossy().as_bytes()).unwrap();
        let boss = CString::new("Boss").unwrap();
        let camper = CString::new("Camper").unwrap();
        let ip = CString::new("10.0.0.1:27960").unwrap();

        unsafe {
            assert!(!urtadmin_load(base.as_ptr(), 0, callbacks()));
            assert!(urtadmin_load(base.as_ptr(), 16, callbacks()));

            let guid = CString::new("BOSS").unwrap();
            urtadmin_client_connect(0, boss.as_ptr(), guid.as_ptr(), ip.as_ptr());
            let guid = CString::new("CAMP").unwrap();
            urtadmin_client_connect(4, camper.as_ptr(), guid.as_ptr(), ip.as_ptr());

            assert!(urtadmin_console_setlevel(boss.as_ptr(), 5));
            assert!(!urtadmin_console_setlevel(boss.as_ptr(), 99));

            let hello = CString::new("hello").unwrap();
            assert!(!urtadmin_chat(0, hello.as_ptr()));
            let kick = CString::new("!kick camper").unwrap();
            assert!(urtadmin_chat(0, kick.as_ptr()));
            assert!(!urtadmin_chat(-1, kick.as_ptr()));
            assert!(!urtadmin_chat(0, std::ptr::null()));
        }

        assert!(urtadmin_reload_levels());
        urtadmin_client_state(4, 1);
        urtadmin_client_state(4, 0);
        unsafe {
            let kick = CString::new("!kick camper").unwrap();
            assert!(urtadmin_chat(0, kick.as_ptr()));
        }
        urtadmin_client_disconnect(4);
        assert!(urtadmin_unload());
        assert!(!urtadmin_reload_levels());

        assert_eq!(
            *EXECUTED.lock().unwrap(),
            vec!["kick 4 \"you have been kicked by Boss\""]
        );
    }
}
