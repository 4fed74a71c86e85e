//! SDK session lifecycle management.
//!
//! A [`HikSession`] owns one authenticated connection to one device:
//! - Initialization (`NET_DVR_Init` + `NET_DVR_Login_V30`)
//! - Operations (JPEG capture, optical zoom get/set, infrared reading)
//! - Teardown (`NET_DVR_Logout` + `NET_DVR_Cleanup`)
//!
//! Operations on a session that is not logged in return
//! [`CallOutcome::NotReady`] without touching the SDK.

use crate::error::{HikError, HikResult};
use crate::infrared::InfraredReader;
use crate::loader::{native_sdk_file_name, HcNetLibrary, NetSdk};
use crate::workdir::WorkdirGuard;
use hik_types::{
    CallOutcome, DeviceInfoV30, FocusModeCfg, JpegPara, Release, SessionConfig, Temperature,
    INVALID_USER_ID, NET_DVR_GET_FOCUSMODECFG, NET_DVR_SET_FOCUSMODECFG,
};
use std::ffi::CString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use hik_types::SessionState;

/// Loads the SDK from a library path, relative to the SDK directory.
pub type SdkLoader = Box<dyn Fn(&Path) -> HikResult<Arc<dyn NetSdk>> + Send>;

/// Box a loader closure as an [`SdkLoader`].
pub fn sdk_loader<F>(loader: F) -> SdkLoader
where
    F: Fn(&Path) -> HikResult<Arc<dyn NetSdk>> + Send + 'static,
{
    Box::new(loader)
}

/// Error code recorded when `NET_DVR_Init` fails.
const INIT_FAILED_CODE: i64 = -1;

/// A session with one camera.
///
/// # Working directory
///
/// The SDK must run with the process working directory set to its install
/// directory. `init` switches to [`SessionConfig::lib_dir`] and teardown
/// switches back. While a session is ready, the whole process sees the SDK
/// directory as its working directory; do not use relative paths elsewhere
/// or run a second session on another thread in that window.
///
/// # Thread Safety
///
/// This struct is intentionally `!Sync`. The `_not_sync` marker ensures this
/// at compile time.
///
/// ## Usage
///
/// ```ignore
/// let config = SessionConfig::new("/opt/hcnet/lib", "10.0.0.5", "admin", "pass");
/// let mut session = HikSession::new(config);
/// session.init()?;
///
/// // Keep the session for a second call, tear down after the last one.
/// session.take_picture("/tmp/a.jpg", Release::Keep);
/// let zoom = session.get_zoom(Release::Teardown);
/// ```
pub struct HikSession {
    config: SessionConfig,

    /// How the SDK is loaded during `init`.
    loader: SdkLoader,

    /// Collaborator for thermal readings.
    infrared: Option<Box<dyn InfraredReader>>,

    /// The loaded SDK, present once `init` got past loading.
    library: Option<Arc<dyn NetSdk>>,

    state: SessionState,

    /// Handle from `NET_DVR_Login_V30`; -1 when not logged in.
    user_id: i32,

    /// Last SDK error observed; 0 when none.
    err_code: i64,

    device_info: Option<DeviceInfoV30>,

    /// Working-directory override held between `init` and teardown.
    workdir: Option<WorkdirGuard>,

    span: tracing::Span,

    _not_sync: std::marker::PhantomData<std::cell::Cell<()>>,
}

impl HikSession {
    /// Create a session that loads the vendor library from `config.lib_dir`.
    ///
    /// No native call is made until [`init`](Self::init). No infrared reader
    /// is attached: attach one with
    /// [`with_infrared_reader`](Self::with_infrared_reader), otherwise
    /// [`get_infrared_value`](Self::get_infrared_value) always returns
    /// [`Temperature::UNAVAILABLE`].
    pub fn new(config: SessionConfig) -> Self {
        Self::with_loader(
            config,
            sdk_loader(|path| {
                let library: Arc<dyn NetSdk> = HcNetLibrary::load(path)?;
                Ok(library)
            }),
        )
    }

    /// Create a session with a custom SDK loader.
    pub fn with_loader(config: SessionConfig, loader: SdkLoader) -> Self {
        let span = tracing::info_span!(
            "hik_session",
            ip = %config.ip,
            port = config.port,
            channel = config.channel
        );

        Self {
            config,
            loader,
            infrared: None,
            library: None,
            state: SessionState::Uninitialized,
            user_id: INVALID_USER_ID,
            err_code: 0,
            device_info: None,
            workdir: None,
            span,
            _not_sync: std::marker::PhantomData,
        }
    }

    /// Attach the reader used by [`get_infrared_value`](Self::get_infrared_value).
    pub fn with_infrared_reader(mut self, reader: impl InfraredReader + 'static) -> Self {
        self.infrared = Some(Box::new(reader));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Login handle, or -1 when not logged in.
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_ready() && self.user_id != INVALID_USER_ID
    }

    /// Last SDK error code seen by this session (0 = none, -1 = init failed).
    pub fn last_error_code(&self) -> i64 {
        self.err_code
    }

    /// Device information returned by the login call.
    pub fn device_info(&self) -> Option<&DeviceInfoV30> {
        self.device_info.as_ref()
    }

    /// Directory that will be restored on teardown, while the override is held.
    pub fn original_dir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(WorkdirGuard::previous)
    }

    /// Load the SDK, initialize it and log in.
    ///
    /// The working directory is switched to the SDK directory first. If
    /// loading or `NET_DVR_Init` fails, the session is left `Faulted` and
    /// the directory is not switched back until the session is dropped.
    /// A login failure tears the SDK down (without logout) before returning.
    pub fn init(&mut self) -> HikResult<&mut Self> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.state != SessionState::Uninitialized {
            return Err(HikError::invalid_state(
                SessionState::Uninitialized,
                self.state,
            ));
        }

        self.step(format_args!(
            "Changing working directory to {}",
            self.config.lib_dir.display()
        ));
        self.workdir = Some(WorkdirGuard::enter(&self.config.lib_dir)?);

        let library_path = PathBuf::from(".").join(native_sdk_file_name());
        self.step(format_args!("Loading {}", library_path.display()));
        let library = match (self.loader)(&library_path) {
            Ok(library) => library,
            Err(e) => {
                self.state = SessionState::Faulted;
                return Err(e);
            }
        };
        self.library = Some(library.clone());

        if !library.init() {
            self.err_code = INIT_FAILED_CODE;
            self.state = SessionState::Faulted;
            tracing::error!("NET_DVR_Init failed");
            return Err(HikError::InitFailed);
        }

        self.login(library.as_ref())?;
        Ok(self)
    }

    fn login(&mut self, library: &dyn NetSdk) -> HikResult<()> {
        self.step(format_args!("Logging in as {}", self.config.username));

        let credentials = c_string("ip", &self.config.ip).and_then(|ip| {
            let username = c_string("username", &self.config.username)?;
            let password = c_string("password", &self.config.password)?;
            Ok((ip, username, password))
        });
        let (ip, username, password) = match credentials {
            Ok(credentials) => credentials,
            Err(e) => {
                self.destroy(false);
                return Err(e);
            }
        };

        let mut device_info = DeviceInfoV30::default();
        let result = library.login_v30(
            &ip,
            self.config.port,
            &username,
            &password,
            &mut device_info,
        );

        if result == INVALID_USER_ID {
            let code = library.last_error();
            self.err_code = i64::from(code);
            tracing::error!(code, "NET_DVR_Login_V30 failed");
            self.destroy(false);
            return Err(HikError::LoginFailed {
                ip: self.config.ip.clone(),
                port: self.config.port,
                code,
            });
        }

        self.user_id = result;
        self.state = SessionState::Ready;
        tracing::info!(
            user_id = result,
            serial = %device_info.serial(),
            "Logged in"
        );
        self.device_info = Some(device_info);
        Ok(())
    }

    /// Log out (optionally), clean up the SDK and restore the working
    /// directory. Logout and cleanup failures are logged, not returned.
    fn destroy(&mut self, logout: bool) {
        if let Some(library) = self.library.clone() {
            if logout {
                self.step(format_args!("Logging out user {}", self.user_id));
                if !library.logout(self.user_id) {
                    tracing::warn!(user_id = self.user_id, "NET_DVR_Logout failed");
                }
            }

            self.step(format_args!("Releasing SDK resources"));
            if !library.cleanup() {
                tracing::warn!("NET_DVR_Cleanup failed");
            }
        }

        self.user_id = INVALID_USER_ID;
        self.state = SessionState::Closed;

        if let Some(guard) = self.workdir.take() {
            match guard.restore() {
                Ok(dir) => self.step(format_args!(
                    "Restored working directory {}",
                    dir.display()
                )),
                Err(e) => tracing::warn!(error = %e, "Failed to restore working directory"),
            }
        }
    }

    /// Tear down a logged-in session without running an operation.
    ///
    /// Does nothing unless the session is ready.
    pub fn close(&mut self) {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.is_logged_in() {
            self.destroy(true);
        }
    }

    /// Run `op`, then tear the session down if `release` asks for it and
    /// the session is still logged in. The outcome is returned unchanged.
    fn with_release<T>(&mut self, release: Release, op: impl FnOnce(&mut Self) -> T) -> T {
        let span = self.span.clone();
        let _enter = span.enter();

        let outcome = op(&mut *self);
        if release.tears_down() && self.is_logged_in() {
            self.destroy(true);
        }
        outcome
    }

    /// The SDK handle, if the session is logged in.
    fn ready_library(&self) -> Option<Arc<dyn NetSdk>> {
        if !self.is_logged_in() {
            return None;
        }
        self.library.clone()
    }

    /// Capture a JPEG snapshot from the configured channel into `path`.
    pub fn take_picture(&mut self, path: impl AsRef<Path>, release: Release) -> CallOutcome<()> {
        let path = path.as_ref();
        self.with_release(release, |session| {
            let Some(library) = session.ready_library() else {
                tracing::debug!(user_id = session.user_id, "Not initialized or init failed");
                return CallOutcome::NotReady;
            };

            session.step(format_args!("Capturing picture to {}", path.display()));
            let Some(file_name) = path.to_str().and_then(|p| CString::new(p).ok()) else {
                tracing::warn!(path = %path.display(), "Picture path cannot be passed to the SDK");
                return CallOutcome::Failed { code: None };
            };

            let mut params = JpegPara::default();
            if library.capture_jpeg(session.user_id, session.config.channel, &mut params, &file_name) {
                CallOutcome::Succeeded(())
            } else {
                let code = session.record_error(library.as_ref());
                tracing::warn!(code, "NET_DVR_CaptureJPEGPicture failed");
                CallOutcome::Failed { code: Some(code) }
            }
        })
    }

    /// Read the current optical zoom level.
    pub fn get_zoom(&mut self, release: Release) -> CallOutcome<f32> {
        self.with_release(release, |session| {
            let Some(library) = session.ready_library() else {
                tracing::debug!(user_id = session.user_id, "Not initialized or init failed");
                return CallOutcome::NotReady;
            };

            match session.read_focus_config(library.as_ref()) {
                Ok(cfg) => CallOutcome::Succeeded(cfg.optical_zoom_level),
                Err(code) => {
                    tracing::warn!(code, "Reading zoom failed");
                    CallOutcome::Failed { code: Some(code) }
                }
            }
        })
    }

    /// Set the optical zoom level.
    ///
    /// Reads the focus block first and skips the write when the device is
    /// already at `zoom`.
    pub fn set_zoom(&mut self, zoom: f32, release: Release) -> CallOutcome<()> {
        self.with_release(release, |session| {
            let Some(library) = session.ready_library() else {
                tracing::debug!(user_id = session.user_id, "Not initialized or init failed");
                return CallOutcome::NotReady;
            };

            session.step(format_args!("Setting zoom to {zoom}"));
            let mut cfg = match session.read_focus_config(library.as_ref()) {
                Ok(cfg) => cfg,
                Err(code) => {
                    tracing::warn!(code, "Reading zoom before update failed");
                    return CallOutcome::Failed { code: Some(code) };
                }
            };

            let current = cfg.optical_zoom_level;
            session.step(format_args!("Current zoom is {current}"));
            if current == zoom {
                session.step(format_args!("Zoom already at {zoom}"));
                return CallOutcome::Succeeded(());
            }

            cfg.optical_zoom_level = zoom;
            if library.set_focus_config(
                session.user_id,
                NET_DVR_SET_FOCUSMODECFG,
                session.config.channel,
                &cfg,
            ) {
                session.step(format_args!("Zoom set to {zoom}"));
                CallOutcome::Succeeded(())
            } else {
                let code = session.record_error(library.as_ref());
                tracing::warn!(code, zoom, "Setting zoom failed");
                CallOutcome::Failed { code: Some(code) }
            }
        })
    }

    /// Read infrared temperature statistics through the attached reader.
    ///
    /// Runs with the working directory switched to the SDK directory and
    /// restores the previous directory afterwards. Any failure, including a
    /// missing reader, yields [`Temperature::UNAVAILABLE`]. Does not depend
    /// on or change the login state.
    pub fn get_infrared_value(&self) -> Temperature {
        let span = self.span.clone();
        let _enter = span.enter();

        // After init the process already sits in the SDK directory, so a
        // relative lib_dir must not be resolved again.
        let sdk_dir = self
            .workdir
            .as_ref()
            .map(WorkdirGuard::target)
            .unwrap_or(&self.config.lib_dir);
        let guard = match WorkdirGuard::enter(sdk_dir) {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!(error = %e, "Cannot enter SDK directory for infrared reading");
                return Temperature::UNAVAILABLE;
            }
        };

        self.step(format_args!("Reading infrared temperature"));
        let reading = match &self.infrared {
            Some(reader) => reader
                .read_temperature(&self.config.ip, &self.config.username, &self.config.password)
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Infrared reading failed");
                    Temperature::UNAVAILABLE
                }),
            None => {
                tracing::error!("No infrared reader attached to session");
                Temperature::UNAVAILABLE
            }
        };

        self.step(format_args!(
            "min {} max {} average {}",
            reading.min, reading.max, reading.average
        ));

        if let Err(e) = guard.restore() {
            tracing::warn!(error = %e, "Failed to restore working directory");
        }
        reading
    }

    fn read_focus_config(&mut self, library: &dyn NetSdk) -> Result<FocusModeCfg, u32> {
        let mut cfg = FocusModeCfg::default();
        let mut returned = 0u32;
        if library.get_focus_config(
            self.user_id,
            NET_DVR_GET_FOCUSMODECFG,
            self.config.channel,
            &mut cfg,
            &mut returned,
        ) {
            Ok(cfg)
        } else {
            Err(self.record_error(library))
        }
    }

    fn record_error(&mut self, library: &dyn NetSdk) -> u32 {
        let code = library.last_error();
        self.err_code = i64::from(code);
        code
    }

    /// Step-by-step progress: DEBUG in debug mode, TRACE otherwise.
    fn step(&self, message: fmt::Arguments<'_>) {
        if self.config.debug {
            tracing::debug!("{}", message);
        } else {
            tracing::trace!("{}", message);
        }
    }
}

impl fmt::Debug for HikSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HikSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("user_id", &self.user_id)
            .field("err_code", &self.err_code)
            .field("has_infrared_reader", &self.infrared.is_some())
            .finish()
    }
}

fn c_string(name: &str, value: &str) -> HikResult<CString> {
    CString::new(value).map_err(|_| HikError::InvalidParameter {
        name: name.to_string(),
        reason: "Contains null byte".to_string(),
    })
}
