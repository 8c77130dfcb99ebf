//! Keyboard injection backends.
//!
//! The backend for the current OS is selected at compile time via
//! `#[cfg(target_os = ...)]`.  [`mock::MockInjector`] is always available; it
//! backs `--dry-run` and the tests.

use std::sync::Arc;

use crate::application::execute_action::{InjectionError, KeyboardInjector};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

/// Creates the injector for the OS this binary was built for.
///
/// # Errors
///
/// Fails when the platform backend cannot be initialised, e.g. no X display
/// is reachable on Linux.
#[cfg(target_os = "linux")]
pub fn platform_injector() -> Result<Arc<dyn KeyboardInjector>, InjectionError> {
    Ok(Arc::new(linux::XTestInjector::new()?))
}

#[cfg(target_os = "windows")]
pub fn platform_injector() -> Result<Arc<dyn KeyboardInjector>, InjectionError> {
    Ok(Arc::new(windows::SendInputInjector::new()))
}

#[cfg(target_os = "macos")]
pub fn platform_injector() -> Result<Arc<dyn KeyboardInjector>, InjectionError> {
    Ok(Arc::new(macos::CgEventInjector::new()?))
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
pub fn platform_injector() -> Result<Arc<dyn KeyboardInjector>, InjectionError> {
    Err(InjectionError::NotInitialized)
}
