//! ExecuteAction use case: performs a resolved [`ActionSpec`] on the host
//! keyboard.
//!
//! The executor delegates every key transition to a [`KeyboardInjector`]
//! trait object; platform implementations live in the infrastructure layer.
//! It tracks which keys it currently holds so that a failure or a stop
//! request part-way through a combo or sequence always leaves the keyboard
//! with nothing pressed.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use irkey_core::profile::MAX_ACTION_DELAY;
use irkey_core::{ActionSpec, HidKeyCode, SequenceStep, SpecialCommand};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::session::{DispatchSession, StopSignal};

/// Delay between the key-down and key-up of a tap.
const TAP_GAP: Duration = Duration::from_millis(10);
/// Granularity at which waits check the stop signal.
const STOP_POLL_SLICE: Duration = Duration::from_millis(10);

/// Error type for keyboard injection.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("key {0:?} has no code on this platform")]
    UnsupportedKey(HidKeyCode),
    #[error("keyboard injector not initialized")]
    NotInitialized,
}

/// Platform-agnostic keyboard injection.
///
/// Each supported OS provides an implementation in the infrastructure layer.
#[cfg_attr(test, mockall::automock)]
pub trait KeyboardInjector: Send + Sync {
    /// Emulates a key press (key-down event).
    fn key_down(&self, key: HidKeyCode) -> Result<(), InjectionError>;

    /// Emulates a key release (key-up event).
    fn key_up(&self, key: HidKeyCode) -> Result<(), InjectionError>;
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("key injection failed: {0}")]
    Injection(#[from] InjectionError),
}

/// What happened when an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Keys were injected to completion.
    Executed,
    /// The stop signal fired mid-action; held keys were released.
    Cancelled,
    /// Ghost key toggled; carries the new state.
    GhostToggled(bool),
    /// Single-tap mode toggled; carries the new state.
    TapToggled(bool),
    /// Auto-repeat toggled; carries the new state.
    RepeatToggled(bool),
    /// The `stop` special ran: keys released, stop signal triggered.
    StopRequested,
}

/// Runs actions against a [`KeyboardInjector`].
pub struct ActionExecutor {
    injector: Arc<dyn KeyboardInjector>,
    stop: StopSignal,
    held: Vec<HidKeyCode>,
}

impl ActionExecutor {
    pub fn new(injector: Arc<dyn KeyboardInjector>, stop: StopSignal) -> Self {
        Self {
            injector,
            stop,
            held: Vec::new(),
        }
    }

    /// Keys currently pressed by this executor, in press order.
    pub fn held_keys(&self) -> &[HidKeyCode] {
        &self.held
    }

    /// Executes one action.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Injection`] when the platform rejects a key event.
    /// All keys held at that point have been released (best effort) before
    /// the error is returned.
    pub fn execute(
        &mut self,
        action: &ActionSpec,
        session: &mut DispatchSession,
    ) -> Result<ActionOutcome, ExecError> {
        let outcome = match self.run(action, session) {
            Ok(ActionOutcome::Executed) if session.ghost_key_enabled => {
                self.ghost_tap(session).map(|()| ActionOutcome::Executed)
            }
            other => other,
        };
        if outcome.is_err() {
            self.release_quietly();
        }
        outcome
    }

    /// Releases every held key in reverse press order.
    ///
    /// Attempts every key even if one fails; returns the first failure.
    pub fn release_all(&mut self) -> Result<(), ExecError> {
        let mut first_err = None;
        while let Some(key) = self.held.pop() {
            if let Err(err) = self.injector.key_up(key) {
                warn!(?key, "key release failed: {err}");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn release_quietly(&mut self) {
        if let Err(err) = self.release_all() {
            warn!("releasing held keys failed: {err}");
        }
    }

    fn run(
        &mut self,
        action: &ActionSpec,
        session: &mut DispatchSession,
    ) -> Result<ActionOutcome, ExecError> {
        match action {
            ActionSpec::Single { key, hold } => self.single(*key, *hold),
            ActionSpec::Combo(keys) => self.combo(keys),
            ActionSpec::Sequence(steps) => self.sequence(steps),
            ActionSpec::Special(command) => self.special(*command, session),
        }
    }

    fn single(&mut self, key: HidKeyCode, hold: Option<Duration>) -> Result<ActionOutcome, ExecError> {
        if self.stop.is_triggered() {
            return Ok(ActionOutcome::Cancelled);
        }
        self.press(key)?;
        let completed = self.wait(hold.unwrap_or(TAP_GAP));
        self.release(key)?;
        Ok(if completed {
            ActionOutcome::Executed
        } else {
            ActionOutcome::Cancelled
        })
    }

    fn combo(&mut self, keys: &[HidKeyCode]) -> Result<ActionOutcome, ExecError> {
        for &key in keys {
            if self.stop.is_triggered() {
                self.release_all()?;
                return Ok(ActionOutcome::Cancelled);
            }
            self.press(key)?;
        }
        self.release_all()?;
        Ok(ActionOutcome::Executed)
    }

    fn sequence(&mut self, steps: &[SequenceStep]) -> Result<ActionOutcome, ExecError> {
        for step in steps {
            if self.stop.is_triggered() {
                self.release_all()?;
                return Ok(ActionOutcome::Cancelled);
            }
            self.press(step.key)?;
            self.wait(TAP_GAP);
            self.release(step.key)?;
            if !self.wait(step.delay) {
                return Ok(ActionOutcome::Cancelled);
            }
        }
        Ok(ActionOutcome::Executed)
    }

    fn special(
        &mut self,
        command: SpecialCommand,
        session: &mut DispatchSession,
    ) -> Result<ActionOutcome, ExecError> {
        match command {
            SpecialCommand::Stop => {
                info!("stop requested by remote");
                self.release_all()?;
                self.stop.trigger();
                Ok(ActionOutcome::StopRequested)
            }
            SpecialCommand::ToggleGhost => {
                let enabled = session.toggle_ghost();
                info!("ghost key {}", if enabled { "ON" } else { "OFF" });
                Ok(ActionOutcome::GhostToggled(enabled))
            }
            SpecialCommand::ToggleTap => {
                let enabled = session.toggle_tap();
                info!("single tap mode {}", if enabled { "ON" } else { "OFF" });
                Ok(ActionOutcome::TapToggled(enabled))
            }
            SpecialCommand::ToggleRepeat => {
                let enabled = session.toggle_repeat();
                info!("auto-repeat {}", if enabled { "ON" } else { "OFF" });
                Ok(ActionOutcome::RepeatToggled(enabled))
            }
        }
    }

    fn ghost_tap(&mut self, session: &DispatchSession) -> Result<(), ExecError> {
        debug!(key = ?session.ghost.key, "ghost key");
        self.press(session.ghost.key)?;
        self.wait(session.ghost.hold);
        self.release(session.ghost.key)
    }

    fn press(&mut self, key: HidKeyCode) -> Result<(), ExecError> {
        self.injector.key_down(key)?;
        self.held.push(key);
        Ok(())
    }

    fn release(&mut self, key: HidKeyCode) -> Result<(), ExecError> {
        if let Some(pos) = self.held.iter().rposition(|k| *k == key) {
            self.held.remove(pos);
        }
        self.injector.key_up(key)?;
        Ok(())
    }

    /// Sleeps for `duration` in slices, returning `false` if the stop signal
    /// fired first.
    fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration.min(MAX_ACTION_DELAY);
        loop {
            if self.stop.is_triggered() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(STOP_POLL_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::sync::Mutex;

    use irkey_core::profile::DEFAULT_SEQUENCE_DELAY;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Down(HidKeyCode),
        Up(HidKeyCode),
    }

    /// Records key events; optionally fails or triggers stop on a given key.
    #[derive(Default)]
    struct RecordingInjector {
        events: Mutex<Vec<Event>>,
        fail_down_on: Option<HidKeyCode>,
        stop_after_down: Option<(HidKeyCode, StopSignal)>,
    }

    impl KeyboardInjector for RecordingInjector {
        fn key_down(&self, key: HidKeyCode) -> Result<(), InjectionError> {
            if self.fail_down_on == Some(key) {
                return Err(InjectionError::Platform("injected failure".to_string()));
            }
            self.events.lock().unwrap().push(Event::Down(key));
            if let Some((stop_key, signal)) = &self.stop_after_down {
                if *stop_key == key {
                    signal.trigger();
                }
            }
            Ok(())
        }

        fn key_up(&self, key: HidKeyCode) -> Result<(), InjectionError> {
            self.events.lock().unwrap().push(Event::Up(key));
            Ok(())
        }
    }

    fn make_executor(injector: RecordingInjector, stop: StopSignal) -> (ActionExecutor, Arc<RecordingInjector>) {
        let injector = Arc::new(injector);
        let executor = ActionExecutor::new(Arc::clone(&injector) as Arc<dyn KeyboardInjector>, stop);
        (executor, injector)
    }

    fn events(injector: &RecordingInjector) -> Vec<Event> {
        injector.events.lock().unwrap().clone()
    }

    #[test]
    fn test_wait_accepts_unbounded_duration() {
        // Arrange
        let stop = StopSignal::new();
        let (executor, _) = make_executor(RecordingInjector::default(), stop.clone());
        stop.trigger();

        // Act
        let completed = executor.wait(Duration::MAX);

        // Assert
        assert!(!completed);
    }

    #[test]
    fn test_combo_presses_in_order_and_releases_in_reverse() {
        // Arrange
        let (mut executor, injector) = make_executor(RecordingInjector::default(), StopSignal::new());
        let action = ActionSpec::Combo(vec![HidKeyCode::ControlLeft, HidKeyCode::KeyC]);

        // Act
        let outcome = executor.execute(&action, &mut DispatchSession::default()).unwrap();

        // Assert
        assert_eq!(outcome, ActionOutcome::Executed);
        assert_eq!(
            events(&injector),
            vec![
                Event::Down(HidKeyCode::ControlLeft),
                Event::Down(HidKeyCode::KeyC),
                Event::Up(HidKeyCode::KeyC),
                Event::Up(HidKeyCode::ControlLeft),
            ]
        );
        assert!(executor.held_keys().is_empty());
    }

    #[test]
    fn test_stop_mid_combo_releases_pressed_keys_in_reverse() {
        // Arrange
        let stop = StopSignal::new();
        let injector = RecordingInjector {
            stop_after_down: Some((HidKeyCode::ShiftLeft, stop.clone())),
            ..RecordingInjector::default()
        };
        let (mut executor, injector) = make_executor(injector, stop);
        let action = ActionSpec::Combo(vec![
            HidKeyCode::ControlLeft,
            HidKeyCode::ShiftLeft,
            HidKeyCode::Escape,
        ]);

        // Act
        let outcome = executor.execute(&action, &mut DispatchSession::default()).unwrap();

        // Assert
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(
            events(&injector),
            vec![
                Event::Down(HidKeyCode::ControlLeft),
                Event::Down(HidKeyCode::ShiftLeft),
                Event::Up(HidKeyCode::ShiftLeft),
                Event::Up(HidKeyCode::ControlLeft),
            ]
        );
        assert!(executor.held_keys().is_empty());
    }

    #[test]
    fn test_single_with_hold_keeps_key_down_for_hold_duration() {
        // Arrange
        let (mut executor, injector) = make_executor(RecordingInjector::default(), StopSignal::new());
        let action = ActionSpec::Single {
            key: HidKeyCode::Enter,
            hold: Some(Duration::from_millis(60)),
        };

        // Act
        let started = Instant::now();
        executor.execute(&action, &mut DispatchSession::default()).unwrap();

        // Assert
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(
            events(&injector),
            vec![Event::Down(HidKeyCode::Enter), Event::Up(HidKeyCode::Enter)]
        );
    }

    #[test]
    fn test_sequence_taps_each_key_in_order() {
        let (mut executor, injector) = make_executor(RecordingInjector::default(), StopSignal::new());
        let action = ActionSpec::Sequence(vec![
            SequenceStep { key: HidKeyCode::MetaLeft, delay: Duration::from_millis(5) },
            SequenceStep { key: HidKeyCode::KeyA, delay: Duration::from_millis(5) },
        ]);

        executor.execute(&action, &mut DispatchSession::default()).unwrap();

        assert_eq!(
            events(&injector),
            vec![
                Event::Down(HidKeyCode::MetaLeft),
                Event::Up(HidKeyCode::MetaLeft),
                Event::Down(HidKeyCode::KeyA),
                Event::Up(HidKeyCode::KeyA),
            ]
        );
    }

    #[test]
    fn test_stop_during_sequence_skips_remaining_steps() {
        // Arrange
        let stop = StopSignal::new();
        let injector = RecordingInjector {
            stop_after_down: Some((HidKeyCode::KeyA, stop.clone())),
            ..RecordingInjector::default()
        };
        let (mut executor, injector) = make_executor(injector, stop);
        let action = ActionSpec::Sequence(vec![
            SequenceStep { key: HidKeyCode::KeyA, delay: DEFAULT_SEQUENCE_DELAY },
            SequenceStep { key: HidKeyCode::KeyB, delay: DEFAULT_SEQUENCE_DELAY },
        ]);

        // Act
        let outcome = executor.execute(&action, &mut DispatchSession::default()).unwrap();

        // Assert
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(
            events(&injector),
            vec![Event::Down(HidKeyCode::KeyA), Event::Up(HidKeyCode::KeyA)]
        );
    }

    #[test]
    fn test_injection_failure_releases_held_keys_and_reports_error() {
        // Arrange
        let injector = RecordingInjector {
            fail_down_on: Some(HidKeyCode::KeyC),
            ..RecordingInjector::default()
        };
        let (mut executor, injector) = make_executor(injector, StopSignal::new());
        let action = ActionSpec::Combo(vec![HidKeyCode::ControlLeft, HidKeyCode::KeyC]);

        // Act
        let result = executor.execute(&action, &mut DispatchSession::default());

        // Assert
        assert!(matches!(result, Err(ExecError::Injection(InjectionError::Platform(_)))));
        assert_eq!(
            events(&injector),
            vec![Event::Down(HidKeyCode::ControlLeft), Event::Up(HidKeyCode::ControlLeft)]
        );
        assert!(executor.held_keys().is_empty());
    }

    #[test]
    fn test_ghost_key_follows_real_action_when_enabled() {
        // Arrange
        let (mut executor, injector) = make_executor(RecordingInjector::default(), StopSignal::new());
        let mut session = DispatchSession::default();
        session.ghost_key_enabled = true;
        session.ghost.hold = Duration::from_millis(1);

        // Act
        executor
            .execute(&ActionSpec::Combo(vec![HidKeyCode::KeyN]), &mut session)
            .unwrap();

        // Assert
        assert_eq!(
            events(&injector),
            vec![
                Event::Down(HidKeyCode::KeyN),
                Event::Up(HidKeyCode::KeyN),
                Event::Down(HidKeyCode::F10),
                Event::Up(HidKeyCode::F10),
            ]
        );
    }

    #[test]
    fn test_special_actions_mutate_session_without_injection() {
        // Arrange
        let stop = StopSignal::new();
        let (mut executor, injector) = make_executor(RecordingInjector::default(), stop.clone());
        let mut session = DispatchSession::default();
        session.ghost_key_enabled = true;

        // Act
        let ghost = executor
            .execute(&ActionSpec::Special(SpecialCommand::ToggleGhost), &mut session)
            .unwrap();
        let tap = executor
            .execute(&ActionSpec::Special(SpecialCommand::ToggleTap), &mut session)
            .unwrap();
        let stopped = executor
            .execute(&ActionSpec::Special(SpecialCommand::Stop), &mut session)
            .unwrap();

        // Assert
        assert_eq!(ghost, ActionOutcome::GhostToggled(false));
        assert_eq!(tap, ActionOutcome::TapToggled(true));
        assert_eq!(stopped, ActionOutcome::StopRequested);
        assert!(stop.is_triggered());
        assert!(events(&injector).is_empty(), "no ghost key after specials");
    }

    #[test]
    fn test_release_all_attempts_every_key_via_mock() {
        // Arrange
        let mut mock = MockKeyboardInjector::new();
        let mut seq = Sequence::new();
        mock.expect_key_down().times(2).returning(|_| Ok(()));
        mock.expect_key_up()
            .with(eq(HidKeyCode::ShiftLeft))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(InjectionError::Platform("stuck".to_string())));
        mock.expect_key_up()
            .with(eq(HidKeyCode::ControlLeft))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let mut executor = ActionExecutor::new(Arc::new(mock), StopSignal::new());
        executor.press(HidKeyCode::ControlLeft).unwrap();
        executor.press(HidKeyCode::ShiftLeft).unwrap();

        // Act
        let result = executor.release_all();

        // Assert
        assert!(result.is_err());
        assert!(executor.held_keys().is_empty());
    }
}
