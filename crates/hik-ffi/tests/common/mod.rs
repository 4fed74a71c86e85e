//! Shared test doubles for session tests.

#![allow(dead_code)]

use hik_ffi::{sdk_loader, HikSession, NetSdk};
use hik_types::{DeviceInfoV30, FocusModeCfg, JpegPara, SessionConfig};
use std::ffi::CStr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Tests in one binary share the process working directory.
static CWD_LOCK: Mutex<()> = Mutex::new(());

pub fn lock_cwd() -> MutexGuard<'static, ()> {
    CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One recorded SDK entry point invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeCall {
    Init,
    Login {
        ip: String,
        port: u16,
        username: String,
        password: String,
    },
    Logout(i32),
    Cleanup,
    LastError,
    Capture {
        user_id: i32,
        channel: i32,
        path: String,
    },
    GetConfig {
        user_id: i32,
        command: u32,
        channel: i32,
    },
    SetConfig {
        user_id: i32,
        command: u32,
        channel: i32,
        zoom: f32,
    },
}

/// Scripted responses of the mock SDK.
#[derive(Clone, Debug)]
pub struct Behavior {
    pub init_ok: bool,
    pub login_result: i32,
    pub logout_ok: bool,
    pub cleanup_ok: bool,
    pub last_error: u32,
    pub capture_ok: bool,
    pub get_config_ok: bool,
    pub set_config_ok: bool,
    pub zoom: f32,
    pub serial: &'static str,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            init_ok: true,
            login_result: 7,
            logout_ok: true,
            cleanup_ok: true,
            last_error: 0,
            capture_ok: true,
            get_config_ok: true,
            set_config_ok: true,
            zoom: 1.0,
            serial: "DS-2TD2617B-3/PA0120200101",
        }
    }
}

/// Recording stand-in for the vendor library.
#[derive(Default)]
pub struct MockSdk {
    calls: Mutex<Vec<NativeCall>>,
    behavior: Mutex<Behavior>,
}

impl MockSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_behavior(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            behavior: Mutex::new(behavior),
        })
    }

    pub fn configure(&self, f: impl FnOnce(&mut Behavior)) {
        f(&mut self.behavior.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&NativeCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|&c| pred(c)).count()
    }

    pub fn zoom(&self) -> f32 {
        self.behavior.lock().unwrap().zoom
    }

    fn record(&self, call: NativeCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn behavior(&self) -> Behavior {
        self.behavior.lock().unwrap().clone()
    }
}

fn text(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl NetSdk for MockSdk {
    fn init(&self) -> bool {
        self.record(NativeCall::Init);
        self.behavior().init_ok
    }

    fn login_v30(
        &self,
        ip: &CStr,
        port: u16,
        username: &CStr,
        password: &CStr,
        device_info: &mut DeviceInfoV30,
    ) -> i32 {
        self.record(NativeCall::Login {
            ip: text(ip),
            port,
            username: text(username),
            password: text(password),
        });
        let behavior = self.behavior();
        if behavior.login_result >= 0 {
            let serial = behavior.serial.as_bytes();
            device_info.serial_number[..serial.len()].copy_from_slice(serial);
            device_info.chan_num = 2;
            device_info.start_chan = 1;
        }
        behavior.login_result
    }

    fn logout(&self, user_id: i32) -> bool {
        self.record(NativeCall::Logout(user_id));
        self.behavior().logout_ok
    }

    fn cleanup(&self) -> bool {
        self.record(NativeCall::Cleanup);
        self.behavior().cleanup_ok
    }

    fn last_error(&self) -> u32 {
        self.record(NativeCall::LastError);
        self.behavior().last_error
    }

    fn capture_jpeg(&self, user_id: i32, channel: i32, params: &mut JpegPara, path: &CStr) -> bool {
        assert_eq!(*params, JpegPara::default());
        self.record(NativeCall::Capture {
            user_id,
            channel,
            path: text(path),
        });
        self.behavior().capture_ok
    }

    fn get_focus_config(
        &self,
        user_id: i32,
        command: u32,
        channel: i32,
        cfg: &mut FocusModeCfg,
        returned: &mut u32,
    ) -> bool {
        self.record(NativeCall::GetConfig {
            user_id,
            command,
            channel,
        });
        let behavior = self.behavior();
        if behavior.get_config_ok {
            cfg.optical_zoom_level = behavior.zoom;
            *returned = std::mem::size_of::<FocusModeCfg>() as u32;
        }
        behavior.get_config_ok
    }

    fn set_focus_config(&self, user_id: i32, command: u32, channel: i32, cfg: &FocusModeCfg) -> bool {
        self.record(NativeCall::SetConfig {
            user_id,
            command,
            channel,
            zoom: cfg.optical_zoom_level,
        });
        let mut behavior = self.behavior.lock().unwrap();
        if behavior.set_config_ok {
            behavior.zoom = cfg.optical_zoom_level;
        }
        behavior.set_config_ok
    }
}

pub fn config(lib_dir: &Path) -> SessionConfig {
    SessionConfig::new(lib_dir, "10.0.0.5", "admin", "pass")
}

/// Session whose loader hands out `mock` instead of loading a library.
pub fn session_with(config: SessionConfig, mock: &Arc<MockSdk>) -> HikSession {
    let mock = mock.clone();
    HikSession::with_loader(
        config,
        sdk_loader(move |_| Ok(mock.clone() as Arc<dyn NetSdk>)),
    )
}

pub fn is_teardown(call: &NativeCall) -> bool {
    matches!(call, NativeCall::Logout(_) | NativeCall::Cleanup)
}
