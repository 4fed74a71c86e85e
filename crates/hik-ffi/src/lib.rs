//! # hik-ffi
//!
//! Safe FFI wrappers for the vendor HCNetSDK camera library.
//!
//! This crate provides a session-oriented Rust interface over the
//! vendor-supplied `libhcnetsdk.so` / `HCNetSDK.dll`. It handles:
//!
//! - Dynamic library loading with `libloading`
//! - Session lifecycle management (Init/Login → operate → Logout/Cleanup)
//! - JPEG capture and optical zoom get/set on one channel
//! - Infrared temperature readings through a pluggable reader
//! - Switching the process working directory to the SDK directory while
//!   the SDK runs
//!
//! # Safety
//!
//! The SDK is closed-source code running in-process. Calls are direct and
//! blocking; there is no timeout or crash isolation beyond what the SDK
//! itself provides. The working-directory override is process-global, so a
//! process should drive at most one session at a time.

pub mod error;
pub mod infrared;
pub mod lifecycle;
pub mod loader;
pub mod workdir;

pub use error::{HikError, HikResult};
pub use infrared::{InfraredError, InfraredReader};
pub use lifecycle::{sdk_loader, HikSession, SdkLoader, SessionState};
pub use loader::{HcNetLibrary, LibraryFormat, NetSdk};
pub use workdir::WorkdirGuard;
