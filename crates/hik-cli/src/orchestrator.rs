//! Runs one camera operation against a fresh session.

use anyhow::{Context, Result};
use hik_ffi::HikSession;
use hik_types::{CallOutcome, DeviceSummary, Release, SessionConfig};
use serde::Serialize;
use std::path::PathBuf;

/// Builds the session for a run.
pub type SessionFactory = Box<dyn Fn(SessionConfig) -> HikSession>;

/// One device operation requested on the command line.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Snapshot { path: PathBuf },
    GetZoom,
    SetZoom { level: f32 },
    Info,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::GetZoom => "zoom-get",
            Self::SetZoom { .. } => "zoom-set",
            Self::Info => "info",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
    NotReady,
}

/// Result of one operation, as printed by [`crate::output`].
#[derive(Clone, Debug, Serialize)]
pub struct OperationReport {
    pub operation: &'static str,
    pub device: String,
    pub channel: i32,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceSummary>,
}

impl OperationReport {
    fn new(operation: &Operation, config: &SessionConfig) -> Self {
        Self {
            operation: operation.name(),
            device: format!("{}:{}", config.ip, config.port),
            channel: config.channel,
            status: Status::Ok,
            error_code: None,
            path: None,
            zoom: None,
            device_info: None,
        }
    }

    fn with_outcome<T>(mut self, outcome: &CallOutcome<T>) -> Self {
        self.status = match outcome {
            CallOutcome::Succeeded(_) => Status::Ok,
            CallOutcome::Failed { .. } => Status::Failed,
            CallOutcome::NotReady => Status::NotReady,
        };
        self.error_code = outcome.error_code();
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// Operation orchestrator.
pub struct Orchestrator {
    config: SessionConfig,
    factory: SessionFactory,
}

impl Orchestrator {
    /// Create an orchestrator that loads the real SDK.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_session_factory(config, Box::new(HikSession::new))
    }

    pub fn with_session_factory(config: SessionConfig, factory: SessionFactory) -> Self {
        Self { config, factory }
    }

    /// Log in, run the operation and tear the session down.
    pub fn run(&self, operation: Operation) -> Result<OperationReport> {
        // init switches the working directory; pin relative paths first.
        let operation = match operation {
            Operation::Snapshot { path } if path.is_relative() => Operation::Snapshot {
                path: std::env::current_dir()
                    .context("Failed to resolve current directory")?
                    .join(path),
            },
            other => other,
        };

        tracing::info!(
            operation = operation.name(),
            ip = %self.config.ip,
            channel = self.config.channel,
            "Starting operation"
        );

        let mut session = (self.factory)(self.config.clone());
        if let Err(e) = session.init() {
            if let Some(code) = e.native_code() {
                tracing::error!(code, "SDK rejected the session");
            }
            let what = if e.is_native() {
                "Device rejected session"
            } else {
                "Failed to open session"
            };
            return Err(anyhow::Error::new(e).context(format!("{what} with {}", self.config.ip)));
        }

        let report = OperationReport::new(&operation, &self.config);
        let report = match operation {
            Operation::Snapshot { path } => {
                let outcome = session.take_picture(&path, Release::Teardown);
                OperationReport {
                    path: Some(path),
                    ..report.with_outcome(&outcome)
                }
            }
            Operation::GetZoom => {
                let outcome = session.get_zoom(Release::Teardown);
                OperationReport {
                    zoom: outcome.ok(),
                    ..report.with_outcome(&outcome)
                }
            }
            Operation::SetZoom { level } => {
                let outcome = session.set_zoom(level, Release::Teardown);
                OperationReport {
                    zoom: Some(level).filter(|_| outcome.is_success()),
                    ..report.with_outcome(&outcome)
                }
            }
            Operation::Info => {
                let summary = session.device_info().map(|info| info.summary());
                session.close();
                OperationReport {
                    device_info: summary,
                    ..report
                }
            }
        };

        tracing::info!(status = ?report.status, "Operation complete");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hik_ffi::{sdk_loader, HikError, NetSdk};
    use hik_types::{DeviceInfoV30, FocusModeCfg, JpegPara};
    use std::ffi::CStr;
    use std::sync::{Arc, Mutex};

    static CWD_LOCK: Mutex<()> = Mutex::new(());

    #[derive(Default)]
    struct FakeSdk {
        login_fails: bool,
        capture_ok: bool,
        zoom: Mutex<f32>,
        captured: Mutex<Vec<String>>,
        teardowns: Mutex<u32>,
    }

    impl NetSdk for FakeSdk {
        fn init(&self) -> bool {
            true
        }

        fn login_v30(
            &self,
            _ip: &CStr,
            _port: u16,
            _username: &CStr,
            _password: &CStr,
            device_info: &mut DeviceInfoV30,
        ) -> i32 {
            if self.login_fails {
                return -1;
            }
            device_info.serial_number[..4].copy_from_slice(b"DS-2");
            device_info.chan_num = 1;
            3
        }

        fn logout(&self, _user_id: i32) -> bool {
            *self.teardowns.lock().unwrap() += 1;
            true
        }

        fn cleanup(&self) -> bool {
            true
        }

        fn last_error(&self) -> u32 {
            41
        }

        fn capture_jpeg(&self, _user_id: i32, _channel: i32, _para: &mut JpegPara, path: &CStr) -> bool {
            self.captured.lock().unwrap().push(path.to_string_lossy().into_owned());
            self.capture_ok
        }

        fn get_focus_config(
            &self,
            _user_id: i32,
            _command: u32,
            _channel: i32,
            cfg: &mut FocusModeCfg,
            returned: &mut u32,
        ) -> bool {
            cfg.optical_zoom_level = *self.zoom.lock().unwrap();
            *returned = std::mem::size_of::<FocusModeCfg>() as u32;
            true
        }

        fn set_focus_config(&self, _user_id: i32, _command: u32, _channel: i32, cfg: &FocusModeCfg) -> bool {
            *self.zoom.lock().unwrap() = cfg.optical_zoom_level;
            true
        }
    }

    fn orchestrator(lib_dir: &std::path::Path, sdk: &Arc<FakeSdk>) -> Orchestrator {
        let config = SessionConfig::new(lib_dir, "10.0.0.5", "admin", "pass").with_debug(false);
        let sdk = sdk.clone();
        Orchestrator::with_session_factory(
            config,
            Box::new(move |config| {
                let sdk = sdk.clone();
                HikSession::with_loader(
                    config,
                    sdk_loader(move |_| Ok(sdk.clone() as Arc<dyn NetSdk>)),
                )
            }),
        )
    }

    #[test]
    fn test_snapshot_path_is_made_absolute() {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let sdk = Arc::new(FakeSdk {
            capture_ok: true,
            ..FakeSdk::default()
        });

        let report = orchestrator(dir.path(), &sdk)
            .run(Operation::Snapshot { path: "shot.jpg".into() })
            .unwrap();

        assert!(report.is_ok());
        assert_eq!(report.path, Some(before.join("shot.jpg")));
        assert_eq!(
            *sdk.captured.lock().unwrap(),
            vec![before.join("shot.jpg").to_string_lossy().into_owned()]
        );
        assert_eq!(*sdk.teardowns.lock().unwrap(), 1);
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_failed_capture_reports_code() {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let sdk = Arc::new(FakeSdk::default());

        let report = orchestrator(dir.path(), &sdk)
            .run(Operation::Snapshot { path: "/tmp/x.jpg".into() })
            .unwrap();

        assert_eq!(report.status, Status::Failed);
        assert_eq!(report.error_code, Some(41));
        assert!(!report.is_ok());
    }

    #[test]
    fn test_zoom_set_then_get() {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let sdk = Arc::new(FakeSdk::default());
        let orchestrator = orchestrator(dir.path(), &sdk);

        let set = orchestrator.run(Operation::SetZoom { level: 6.0 }).unwrap();
        assert_eq!(set.zoom, Some(6.0));

        let get = orchestrator.run(Operation::GetZoom).unwrap();
        assert_eq!(get.zoom, Some(6.0));
        assert_eq!(get.operation, "zoom-get");
        assert_eq!(*sdk.teardowns.lock().unwrap(), 2);
    }

    #[test]
    fn test_info_closes_session() {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let sdk = Arc::new(FakeSdk::default());

        let report = orchestrator(dir.path(), &sdk).run(Operation::Info).unwrap();

        let info = report.device_info.unwrap();
        assert_eq!(info.serial, "DS-2");
        assert_eq!(info.analog_channels, 1);
        assert_eq!(report.device, "10.0.0.5:8000");
        assert_eq!(*sdk.teardowns.lock().unwrap(), 1);
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_init_failure_is_an_error() {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let sdk = Arc::new(FakeSdk::default());

        let err = orchestrator("/nonexistent/hcnet".as_ref(), &sdk)
            .run(Operation::GetZoom)
            .unwrap_err();

        assert!(err.to_string().contains("Failed to open session"));
    }

    #[test]
    fn test_login_rejection_keeps_sdk_code() {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let sdk = Arc::new(FakeSdk {
            login_fails: true,
            ..FakeSdk::default()
        });

        let err = orchestrator(dir.path(), &sdk)
            .run(Operation::Info)
            .unwrap_err();

        assert!(err.to_string().contains("Device rejected session"));
        let cause = err.downcast_ref::<HikError>().unwrap();
        assert_eq!(cause.native_code(), Some(41));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
