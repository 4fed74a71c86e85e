//! # hik-types
//!
//! Core type definitions for the HCNetSDK session wrapper.
//!
//! This crate provides the types shared across the workspace:
//! - `#[repr(C)]` mirrors of the SDK structures passed across the FFI boundary
//! - Session configuration, lifecycle state and call outcomes
//! - Infrared temperature readings

pub mod sdk;
pub mod session;

pub use sdk::*;
pub use session::*;
