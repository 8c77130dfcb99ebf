//! The dispatch loop: read one code, debounce, map, execute.
//!
//! # How it fits together (for beginners)
//!
//! ```text
//! CodeSource ──code──► Debouncer ──ButtonEvent──► ActiveProfile ──ActionSpec──► ActionExecutor
//!     ▲                    │
//!     └── Ok(None) ────────┴── poll_idle() → Release
//! ```
//!
//! The source is read with a bounded timeout. A timeout (`Ok(None)`) is not an
//! error; it gives the loop a chance to check the stop signal and to emit an
//! idle `Release`. Everything runs on one thread, so events are handled in
//! strict arrival order.

use std::time::Instant;

use irkey_core::NormalizedCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::debounce::{ButtonEventKind, Debouncer};
use super::execute_action::{ActionExecutor, ActionOutcome};
use super::mapper::ActiveProfile;
use super::session::{DispatchSession, StatusSnapshot, StopSignal};

/// Failure of the link that supplies codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection lost: {0}")]
    Lost(String),
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Anything that yields normalized codes, one per call.
pub trait CodeSource {
    /// Blocks for at most the source's read timeout.
    ///
    /// `Ok(None)` means nothing arrived in time.
    fn next_code(&mut self) -> Result<Option<NormalizedCode>, ConnectionError>;
}

/// What the dispatcher did with one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Debounced away.
    Suppressed,
    /// Accepted, but the active profile has no binding for it.
    Unmapped,
    Executed(ActionOutcome),
    /// Injection failed; the event was dropped.
    InjectionFailed,
    /// Idle release of the held button.
    Released,
}

pub struct Dispatcher {
    debouncer: Debouncer,
    profile: ActiveProfile,
    executor: ActionExecutor,
    session: DispatchSession,
    stop: StopSignal,
    connected: bool,
}

impl Dispatcher {
    pub fn new(
        debouncer: Debouncer,
        profile: ActiveProfile,
        executor: ActionExecutor,
        session: DispatchSession,
        stop: StopSignal,
    ) -> Self {
        Self {
            debouncer,
            profile,
            executor,
            session,
            stop,
            connected: false,
        }
    }

    pub fn session(&self) -> &DispatchSession {
        &self.session
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            running: !self.stop.is_triggered(),
            connected: self.connected,
            profile: self.profile.name(),
            ghost_key_enabled: self.session.ghost_key_enabled,
            single_tap_enabled: self.session.single_tap_enabled,
        }
    }

    /// Handles one received code.
    pub fn handle_code(&mut self, code: NormalizedCode, at: Instant) -> DispatchOutcome {
        let single_tap = self.session.single_tap_enabled;
        let Some(event) = self.debouncer.observe(code, at, single_tap) else {
            return DispatchOutcome::Suppressed;
        };

        let Some(mapping) = self.profile.lookup(&event.code) else {
            debug!(code = %event.code, "unmapped code");
            return DispatchOutcome::Unmapped;
        };

        if event.kind == ButtonEventKind::Hold {
            if !self.session.repeat_enabled {
                debug!(code = %event.code, "held, auto-repeat off");
                return DispatchOutcome::Suppressed;
            }
            debug!(code = %event.code, "held");
        }
        info!(code = %event.code, action = %mapping.action, "{}", mapping.description);

        match self.executor.execute(&mapping.action, &mut self.session) {
            Ok(outcome) => DispatchOutcome::Executed(outcome),
            Err(err) => {
                warn!(code = %event.code, "action dropped: {err}");
                DispatchOutcome::InjectionFailed
            }
        }
    }

    /// Called when a read timed out. Emits the idle release if due.
    pub fn handle_idle(&mut self, now: Instant) -> Option<DispatchOutcome> {
        let event = self.debouncer.poll_idle(now)?;
        debug!(code = %event.code, "released");
        if let Err(err) = self.executor.release_all() {
            warn!("idle release failed: {err}");
        }
        Some(DispatchOutcome::Released)
    }

    /// Runs until the stop signal fires, the source closes, or the link fails.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Connection`] when the link is lost. Held keys are
    /// released before returning.
    pub fn run<S: CodeSource + ?Sized>(&mut self, source: &mut S) -> Result<(), DispatchError> {
        self.connected = true;
        let result = self.run_inner(source);
        self.connected = false;
        if let Err(err) = self.executor.release_all() {
            warn!("releasing keys on exit failed: {err}");
        }
        self.debouncer.reset();
        result
    }

    fn run_inner<S: CodeSource + ?Sized>(&mut self, source: &mut S) -> Result<(), DispatchError> {
        while !self.stop.is_triggered() {
            match source.next_code() {
                Ok(Some(code)) => {
                    self.handle_code(code, Instant::now());
                }
                Ok(None) => {
                    self.handle_idle(Instant::now());
                }
                Err(ConnectionError::Closed) => {
                    info!("code source closed");
                    return Ok(());
                }
                Err(err) => {
                    warn!("{err}");
                    return Err(err.into());
                }
            }
        }
        debug!("stop signal observed");
        Ok(())
    }
}
