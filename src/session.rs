//! Connection state machine and in-flight operation gate.
//!
//! The session has two stable states, `Disconnected` and `Connected`. Remote calls are
//! the transition edges: [`ConnectionSession::begin_connect`] validates a transition and
//! hands back the device to connect to, and the `complete_*` methods apply the outcome
//! once the service has acknowledged it. A failed remote call simply never reaches
//! `complete_*`, so the session stays where it was.
//!
//! [`OperationGate`] serializes remote work. Only one of discover, connect, disconnect or
//! push may be outstanding at a time; a second request is rejected with
//! [`GlassesError::Busy`] instead of being allowed to race the first.

use crate::directory::{Device, DeviceDirectory};
use crate::error::{AppResult, GlassesError};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Stable connection states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => f.write_str("disconnected"),
            SessionState::Connected => f.write_str("connected"),
        }
    }
}

/// Remote operations guarded by the [`OperationGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Discover,
    Connect,
    Disconnect,
    Push,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Discover => "discover",
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Push => "push",
        };
        f.write_str(name)
    }
}

/// Client-side view of the link to the glasses.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSession {
    state: SessionState,
    device: Option<Device>,
}

impl ConnectionSession {
    /// Start disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once a connect has been acknowledged.
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Device recorded by the last successful connect.
    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }

    /// Check that a connect may be issued and return the device to connect to.
    ///
    /// The returned device is a copy of the directory's selection at this moment.
    pub fn begin_connect(&self, directory: &DeviceDirectory) -> AppResult<Device> {
        if let Some(device) = self.device.as_ref().filter(|_| self.is_connected()) {
            return Err(GlassesError::AlreadyConnected(device.name.clone()));
        }
        directory.selected().cloned().ok_or(GlassesError::NoSelection)
    }

    /// Apply an acknowledged connect.
    pub fn complete_connect(&mut self, device: Device) {
        debug!(device = %device, "Session connected");
        self.state = SessionState::Connected;
        self.device = Some(device);
    }

    /// Apply an acknowledged disconnect.
    pub fn complete_disconnect(&mut self) {
        debug!("Session disconnected");
        self.state = SessionState::Disconnected;
        self.device = None;
    }

    /// Fail with [`GlassesError::NotConnected`] unless connected.
    pub fn require_connected(&self) -> AppResult<&Device> {
        match (&self.state, &self.device) {
            (SessionState::Connected, Some(device)) => Ok(device),
            _ => Err(GlassesError::NotConnected),
        }
    }
}

/// Admits at most one remote operation at a time.
#[derive(Debug, Clone, Default)]
pub struct OperationGate {
    active: Arc<Mutex<Option<Operation>>>,
}

impl OperationGate {
    /// Create an idle gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate for `operation`.
    ///
    /// Fails with [`GlassesError::Busy`] naming the operation already in flight.
    pub fn try_begin(&self, operation: Operation) -> AppResult<OperationPermit> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = *active {
            debug!(requested = %operation, active = %current, "Rejecting overlapping operation");
            return Err(GlassesError::Busy(current));
        }
        *active = Some(operation);
        Ok(OperationPermit {
            active: Arc::clone(&self.active),
            operation,
        })
    }

    /// Operation currently holding the gate.
    pub fn active(&self) -> Option<Operation> {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held while a remote operation is in flight; releases the gate on drop.
#[derive(Debug)]
pub struct OperationPermit {
    active: Arc<Mutex<Option<Operation>>>,
    operation: Operation,
}

impl OperationPermit {
    /// The operation this permit was issued for.
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for OperationPermit {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = None;
    }
}
