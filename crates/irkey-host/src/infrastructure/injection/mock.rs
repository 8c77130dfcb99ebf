//! Recording keyboard injector.
//!
//! Replaces OS calls with in-memory recording so tests can assert exactly
//! which key transitions happened and in what order.  [`MockInjector::dry_run`]
//! is the `--dry-run` backend: it logs every transition and records nothing,
//! so a long session does not accumulate history.
//!
//! # Failure and stop hooks
//!
//! - `should_fail` makes every call return `InjectionError::Platform`.
//! - `fail_on` makes only key-downs of one key fail.
//! - `stop_after_downs` triggers a [`StopSignal`] once the given number of
//!   key-downs has been recorded, to exercise cancellation mid-action.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use irkey_core::HidKeyCode;
use tracing::info;

use crate::application::execute_action::{InjectionError, KeyboardInjector};
use crate::application::session::StopSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(HidKeyCode),
    Up(HidKeyCode),
}

#[derive(Default)]
pub struct MockInjector {
    events: Mutex<Vec<KeyEvent>>,
    downs: AtomicUsize,
    pub should_fail: bool,
    pub fail_on: Option<HidKeyCode>,
    pub stop_after_downs: Option<(usize, StopSignal)>,
    log_only: bool,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs each transition at info level without recording it.
    pub fn dry_run() -> Self {
        Self {
            log_only: true,
            ..Self::default()
        }
    }

    /// A recorder whose key-downs of `key` fail.
    pub fn failing_on(key: HidKeyCode) -> Self {
        Self {
            fail_on: Some(key),
            ..Self::default()
        }
    }

    /// A recorder that triggers `stop` once `downs` key-downs have happened.
    pub fn stopping_after(downs: usize, stop: StopSignal) -> Self {
        Self {
            stop_after_downs: Some((downs, stop)),
            ..Self::default()
        }
    }

    /// Number of successful key-downs, including unrecorded dry-run ones.
    pub fn down_count(&self) -> usize {
        self.downs.load(Ordering::SeqCst)
    }

    /// All recorded transitions in order.
    pub fn events(&self) -> Vec<KeyEvent> {
        self.lock().clone()
    }

    /// Keys pressed and not yet released, according to the recording.
    pub fn pressed(&self) -> Vec<HidKeyCode> {
        let mut pressed = Vec::new();
        for event in self.lock().iter() {
            match *event {
                KeyEvent::Down(key) => pressed.push(key),
                KeyEvent::Up(key) => {
                    if let Some(pos) = pressed.iter().rposition(|k| *k == key) {
                        pressed.remove(pos);
                    }
                }
            }
        }
        pressed
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.downs.store(0, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<KeyEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyboardInjector for MockInjector {
    fn key_down(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        if self.should_fail || self.fail_on == Some(key) {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        if self.log_only {
            info!("[dry-run] key down {key}");
        } else {
            self.lock().push(KeyEvent::Down(key));
        }
        let downs = self.downs.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, stop)) = &self.stop_after_downs {
            if downs >= *after {
                stop.trigger();
            }
        }
        Ok(())
    }

    fn key_up(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        if self.log_only {
            info!("[dry-run] key up {key}");
        } else {
            self.lock().push(KeyEvent::Up(key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_transitions_in_order() {
        // Arrange
        let injector = MockInjector::new();

        // Act
        injector.key_down(HidKeyCode::KeyA).unwrap();
        injector.key_up(HidKeyCode::KeyA).unwrap();

        // Assert
        assert_eq!(
            injector.events(),
            vec![KeyEvent::Down(HidKeyCode::KeyA), KeyEvent::Up(HidKeyCode::KeyA)]
        );
        assert!(injector.pressed().is_empty());
    }

    #[test]
    fn test_should_fail_returns_platform_error() {
        let injector = MockInjector {
            should_fail: true,
            ..MockInjector::default()
        };

        let result = injector.key_down(HidKeyCode::KeyA);

        assert!(matches!(result, Err(InjectionError::Platform(_))));
        assert!(injector.events().is_empty());
    }

    #[test]
    fn test_stop_after_downs_triggers_signal() {
        // Arrange
        let stop = StopSignal::new();
        let injector = MockInjector::stopping_after(2, stop.clone());

        // Act
        injector.key_down(HidKeyCode::ControlLeft).unwrap();
        let after_first = stop.is_triggered();
        injector.key_down(HidKeyCode::KeyC).unwrap();

        // Assert
        assert!(!after_first);
        assert!(stop.is_triggered());
        assert_eq!(injector.pressed(), vec![HidKeyCode::ControlLeft, HidKeyCode::KeyC]);
    }

    #[test]
    fn test_failing_on_only_rejects_that_key() {
        let injector = MockInjector::failing_on(HidKeyCode::KeyC);

        assert!(injector.key_down(HidKeyCode::ControlLeft).is_ok());
        assert!(matches!(
            injector.key_down(HidKeyCode::KeyC),
            Err(InjectionError::Platform(_))
        ));
        assert_eq!(injector.down_count(), 1);
    }

    #[test]
    fn test_dry_run_does_not_accumulate_history() {
        // Arrange
        let injector = MockInjector::dry_run();

        // Act
        for _ in 0..10_000 {
            injector.key_down(HidKeyCode::KeyA).unwrap();
            injector.key_up(HidKeyCode::KeyA).unwrap();
        }

        // Assert
        assert!(injector.events().is_empty());
        assert_eq!(injector.down_count(), 10_000);
    }
}
