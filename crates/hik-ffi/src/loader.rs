//! Dynamic loading of the HCNetSDK shared library.
//!
//! This module resolves the SDK entry points used by a session and exposes
//! them through the [`NetSdk`] trait, so the session logic can run against
//! the real library or a test double.

use crate::error::{HikError, HikResult};
use hik_types::{DeviceInfoV30, FocusModeCfg, JpegPara, CONFIG_BUFFER_SIZE};
use libloading::Library;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::mem::size_of;
use std::path::Path;
use std::sync::Arc;

/// SDK `BOOL` (zero = failure). `LONG` handles are 32-bit `int` in the SDK headers.
pub type Bool = c_int;

/// `BOOL NET_DVR_Init();`
pub type InitFn = unsafe extern "system" fn() -> Bool;

/// ```c
/// LONG NET_DVR_Login_V30(
///     char *sDVRIP,
///     WORD  wDVRPort,
///     char *sUserName,
///     char *sPassword,
///     LPNET_DVR_DEVICEINFO_V30 lpDeviceInfo
/// );
/// ```
pub type LoginV30Fn = unsafe extern "system" fn(
    ip: *const c_char,
    port: u16,
    username: *const c_char,
    password: *const c_char,
    device_info: *mut DeviceInfoV30,
) -> c_int;

/// `BOOL NET_DVR_Logout(LONG lUserID);`
pub type LogoutFn = unsafe extern "system" fn(user_id: c_int) -> Bool;

/// `BOOL NET_DVR_Cleanup();`
pub type CleanupFn = unsafe extern "system" fn() -> Bool;

/// `DWORD NET_DVR_GetLastError();`
pub type GetLastErrorFn = unsafe extern "system" fn() -> u32;

/// ```c
/// BOOL NET_DVR_CaptureJPEGPicture(
///     LONG lUserID,
///     LONG lChannel,
///     LPNET_DVR_JPEGPARA lpJpegPara,
///     char *sPicFileName
/// );
/// ```
pub type CaptureJpegFn = unsafe extern "system" fn(
    user_id: c_int,
    channel: c_int,
    params: *mut JpegPara,
    file_name: *const c_char,
) -> Bool;

/// ```c
/// BOOL NET_DVR_GetDVRConfig(
///     LONG    lUserID,
///     DWORD   dwCommand,
///     LONG    lChannel,
///     LPVOID  lpOutBuffer,
///     DWORD   dwOutBufferSize,
///     LPDWORD lpBytesReturned
/// );
/// ```
pub type GetDvrConfigFn = unsafe extern "system" fn(
    user_id: c_int,
    command: u32,
    channel: c_int,
    out_buffer: *mut c_void,
    out_buffer_size: u32,
    bytes_returned: *mut u32,
) -> Bool;

/// ```c
/// BOOL NET_DVR_SetDVRConfig(
///     LONG   lUserID,
///     DWORD  dwCommand,
///     LONG   lChannel,
///     LPVOID lpInBuffer,
///     DWORD  dwInBufferSize
/// );
/// ```
pub type SetDvrConfigFn = unsafe extern "system" fn(
    user_id: c_int,
    command: u32,
    channel: c_int,
    in_buffer: *mut c_void,
    in_buffer_size: u32,
) -> Bool;

/// The SDK entry points a session calls.
///
/// Every method is a direct blocking call into the vendor library. Boolean
/// returns mirror the SDK's `BOOL`; handles and error codes are passed
/// through unchanged.
pub trait NetSdk: Send + Sync {
    /// `NET_DVR_Init`.
    fn init(&self) -> bool;

    /// `NET_DVR_Login_V30`. Returns the user handle or -1.
    fn login_v30(
        &self,
        ip: &CStr,
        port: u16,
        username: &CStr,
        password: &CStr,
        device_info: &mut DeviceInfoV30,
    ) -> i32;

    /// `NET_DVR_Logout`.
    fn logout(&self, user_id: i32) -> bool;

    /// `NET_DVR_Cleanup`.
    fn cleanup(&self) -> bool;

    /// `NET_DVR_GetLastError`.
    fn last_error(&self) -> u32;

    /// `NET_DVR_CaptureJPEGPicture`, writing the JPEG to `path`.
    fn capture_jpeg(&self, user_id: i32, channel: i32, params: &mut JpegPara, path: &CStr) -> bool;

    /// `NET_DVR_GetDVRConfig` for the focus mode block. `returned` receives
    /// the number of bytes the SDK wrote.
    fn get_focus_config(
        &self,
        user_id: i32,
        command: u32,
        channel: i32,
        cfg: &mut FocusModeCfg,
        returned: &mut u32,
    ) -> bool;

    /// `NET_DVR_SetDVRConfig` for the focus mode block.
    fn set_focus_config(&self, user_id: i32, command: u32, channel: i32, cfg: &FocusModeCfg) -> bool;
}

/// Focus block padded to the buffer size the SDK is told it may use.
#[repr(C)]
struct FocusConfigBuffer {
    cfg: FocusModeCfg,
    _tail: [u8; CONFIG_BUFFER_SIZE as usize - size_of::<FocusModeCfg>()],
}

impl FocusConfigBuffer {
    fn new(cfg: FocusModeCfg) -> Self {
        Self {
            cfg,
            _tail: [0; CONFIG_BUFFER_SIZE as usize - size_of::<FocusModeCfg>()],
        }
    }
}

/// Loaded HCNetSDK library with resolved entry points.
pub struct HcNetLibrary {
    /// The underlying dynamic library handle.
    #[allow(dead_code)]
    library: Library,

    /// Path the library was loaded from.
    pub path: String,

    init: InitFn,
    login_v30: LoginV30Fn,
    logout: LogoutFn,
    cleanup: CleanupFn,
    get_last_error: GetLastErrorFn,
    capture_jpeg: CaptureJpegFn,
    get_dvr_config: GetDvrConfigFn,
    set_dvr_config: SetDvrConfigFn,
}

/// Resolve a symbol and copy out the function pointer.
///
/// # Safety
///
/// `T` must match the symbol's actual signature.
unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> HikResult<T> {
    let mut bytes = Vec::with_capacity(name.len() + 1);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);

    // SAFETY: caller guarantees the signature.
    unsafe {
        library
            .get::<T>(&bytes)
            .map(|s| *s)
            .map_err(|_| HikError::symbol_not_found(name))
    }
}

impl HcNetLibrary {
    /// Load the SDK from a shared library file.
    ///
    /// A relative `path` is resolved against the current working directory,
    /// which the session points at the SDK directory before loading.
    ///
    /// # Safety
    ///
    /// The library must export the HCNetSDK entry points with the signatures
    /// declared in this module. Invalid libraries cause undefined behavior.
    pub fn load<P: AsRef<Path>>(path: P) -> HikResult<Arc<Self>> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let format = LibraryFormat::from_path(path);
        if format != LibraryFormat::native() {
            tracing::warn!(
                path = %path_str,
                ?format,
                expected = ?LibraryFormat::native(),
                "Library file does not match the platform format"
            );
        }

        let library = unsafe { Library::new(path) }
            .map_err(|e| HikError::load_error(&path_str, e))?;

        let sdk = unsafe {
            Self {
                init: symbol(&library, "NET_DVR_Init")?,
                login_v30: symbol(&library, "NET_DVR_Login_V30")?,
                logout: symbol(&library, "NET_DVR_Logout")?,
                cleanup: symbol(&library, "NET_DVR_Cleanup")?,
                get_last_error: symbol(&library, "NET_DVR_GetLastError")?,
                capture_jpeg: symbol(&library, "NET_DVR_CaptureJPEGPicture")?,
                get_dvr_config: symbol(&library, "NET_DVR_GetDVRConfig")?,
                set_dvr_config: symbol(&library, "NET_DVR_SetDVRConfig")?,
                library,
                path: path_str,
            }
        };

        tracing::info!(path = %sdk.path, "Loaded HCNetSDK library");

        Ok(Arc::new(sdk))
    }
}

impl NetSdk for HcNetLibrary {
    fn init(&self) -> bool {
        unsafe { (self.init)() != 0 }
    }

    fn login_v30(
        &self,
        ip: &CStr,
        port: u16,
        username: &CStr,
        password: &CStr,
        device_info: &mut DeviceInfoV30,
    ) -> i32 {
        unsafe {
            (self.login_v30)(
                ip.as_ptr(),
                port,
                username.as_ptr(),
                password.as_ptr(),
                device_info,
            )
        }
    }

    fn logout(&self, user_id: i32) -> bool {
        unsafe { (self.logout)(user_id) != 0 }
    }

    fn cleanup(&self) -> bool {
        unsafe { (self.cleanup)() != 0 }
    }

    fn last_error(&self) -> u32 {
        unsafe { (self.get_last_error)() }
    }

    fn capture_jpeg(&self, user_id: i32, channel: i32, params: &mut JpegPara, path: &CStr) -> bool {
        unsafe { (self.capture_jpeg)(user_id, channel, params, path.as_ptr()) != 0 }
    }

    fn get_focus_config(
        &self,
        user_id: i32,
        command: u32,
        channel: i32,
        cfg: &mut FocusModeCfg,
        returned: &mut u32,
    ) -> bool {
        let mut buffer = FocusConfigBuffer::new(*cfg);
        let ok = unsafe {
            (self.get_dvr_config)(
                user_id,
                command,
                channel,
                (&mut buffer as *mut FocusConfigBuffer).cast(),
                CONFIG_BUFFER_SIZE,
                returned,
            ) != 0
        };
        *cfg = buffer.cfg;
        ok
    }

    fn set_focus_config(&self, user_id: i32, command: u32, channel: i32, cfg: &FocusModeCfg) -> bool {
        let mut buffer = FocusConfigBuffer::new(*cfg);
        unsafe {
            (self.set_dvr_config)(
                user_id,
                command,
                channel,
                (&mut buffer as *mut FocusConfigBuffer).cast(),
                CONFIG_BUFFER_SIZE,
            ) != 0
        }
    }
}

// HcNetLibrary is Send + Sync because it only stores function pointers
// and the Library handle. The SDK itself serializes its global state.
unsafe impl Send for HcNetLibrary {}
unsafe impl Sync for HcNetLibrary {}

/// Platform-specific library format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryFormat {
    /// Windows DLL.
    Dll,
    /// Linux/Unix shared object.
    So,
    /// macOS dynamic library.
    Dylib,
    /// Unknown format.
    Unknown,
}

impl LibraryFormat {
    /// Detect format from file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("dll") | Some("DLL") => Self::Dll,
            Some("so") => Self::So,
            Some("dylib") => Self::Dylib,
            _ => Self::Unknown,
        }
    }

    /// File name the vendor ships the SDK under for this format.
    pub fn sdk_file_name(self) -> Option<&'static str> {
        match self {
            Self::Dll => Some("HCNetSDK.dll"),
            Self::So => Some("libhcnetsdk.so"),
            Self::Dylib => Some("libhcnetsdk.dylib"),
            Self::Unknown => None,
        }
    }

    /// Get the format for the current platform.
    #[cfg(target_os = "windows")]
    pub fn native() -> Self {
        Self::Dll
    }

    #[cfg(target_os = "macos")]
    pub fn native() -> Self {
        Self::Dylib
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    pub fn native() -> Self {
        Self::So
    }

    #[cfg(not(any(unix, target_os = "windows")))]
    pub fn native() -> Self {
        Self::Unknown
    }
}

/// SDK file name for the current platform.
pub fn native_sdk_file_name() -> &'static str {
    LibraryFormat::native()
        .sdk_file_name()
        .unwrap_or("libhcnetsdk.so")
}
