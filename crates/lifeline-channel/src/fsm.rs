//! Connection state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐   Connect    ┌─────────────────┐
//! │  Disconnected   │ ───────────► │   Connecting    │
//! │   (initial)     │ ◄─────────── │                 │
//! └─────────────────┘    Failed    └────────┬────────┘
//!          ▲                                │ Opened
//!          │ Dropped / Shutdown             ▼
//!          │                       ┌─────────────────┐
//!          └────────────────────── │    Connected    │
//!                                  └─────────────────┘
//! ```
//!
//! Reconnection is driven from outside the machine: after `Dropped` or
//! `Failed` the client sleeps per [`ReconnectPolicy`] and feeds `Connect`
//! again, unless it was shut down.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub connection_machine(Disconnected)

    Disconnected => {
        Connect => Connecting,
        Shutdown => Disconnected
    },
    Connecting => {
        Opened => Connected,
        Failed => Disconnected,
        Shutdown => Disconnected
    },
    Connected => {
        Dropped => Disconnected,
        Shutdown => Disconnected
    }
}

pub use connection_machine::Input as ConnectionInput;
pub use connection_machine::State as ConnectionMachineState;
pub use connection_machine::StateMachine as ConnectionMachine;

/// Connection status exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl From<&ConnectionMachineState> for ConnectionState {
    fn from(state: &ConnectionMachineState) -> Self {
        match state {
            ConnectionMachineState::Disconnected => ConnectionState::Disconnected,
            ConnectionMachineState::Connecting => ConnectionState::Connecting,
            ConnectionMachineState::Connected => ConnectionState::Connected,
        }
    }
}

/// Backoff schedule for reconnect attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling for any single delay.
    pub max_delay: Duration,
    /// Consecutive failed attempts allowed before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before retry number `attempt` (0-indexed): `base * 2^attempt`, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Whether another attempt is allowed after `failed` consecutive failures.
    pub fn allows_attempt(&self, failed: u32) -> bool {
        self.max_attempts.map_or(true, |max| failed < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        let machine = ConnectionMachine::new();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);
    }

    #[test]
    fn test_connect_flow() {
        let mut machine = ConnectionMachine::new();

        machine.consume(&ConnectionInput::Connect).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Connecting);

        machine.consume(&ConnectionInput::Opened).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Connected);
    }

    #[test]
    fn test_drop_then_reconnect() {
        let mut machine = ConnectionMachine::new();
        machine.consume(&ConnectionInput::Connect).unwrap();
        machine.consume(&ConnectionInput::Opened).unwrap();

        machine.consume(&ConnectionInput::Dropped).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);

        machine.consume(&ConnectionInput::Connect).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Connecting);
    }

    #[test]
    fn test_failed_connect_returns_to_disconnected() {
        let mut machine = ConnectionMachine::new();
        machine.consume(&ConnectionInput::Connect).unwrap();

        machine.consume(&ConnectionInput::Failed).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);
    }

    #[test]
    fn test_shutdown_allowed_from_every_state() {
        let mut machine = ConnectionMachine::new();
        machine.consume(&ConnectionInput::Shutdown).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);

        machine.consume(&ConnectionInput::Connect).unwrap();
        machine.consume(&ConnectionInput::Shutdown).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);

        machine.consume(&ConnectionInput::Connect).unwrap();
        machine.consume(&ConnectionInput::Opened).unwrap();
        machine.consume(&ConnectionInput::Shutdown).unwrap();
        assert_eq!(*machine.state(), ConnectionMachineState::Disconnected);
    }

    #[test]
    fn test_invalid_transitions_return_error() {
        let mut machine = ConnectionMachine::new();

        // Can't open without connecting
        assert!(machine.consume(&ConnectionInput::Opened).is_err());
        // Can't drop a connection that doesn't exist
        assert!(machine.consume(&ConnectionInput::Dropped).is_err());

        machine.consume(&ConnectionInput::Connect).unwrap();
        machine.consume(&ConnectionInput::Opened).unwrap();
        // Can't connect twice
        assert!(machine.consume(&ConnectionInput::Connect).is_err());
        assert_eq!(*machine.state(), ConnectionMachineState::Connected);
    }

    #[test]
    fn test_connection_state_conversion() {
        assert_eq!(
            ConnectionState::from(&ConnectionMachineState::Connecting),
            ConnectionState::Connecting
        );
        assert!(ConnectionState::from(&ConnectionMachineState::Connected).is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            max_attempts: None,
        };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(5));
    }

    #[test]
    fn test_attempt_cap() {
        let unbounded = ReconnectPolicy::default();
        assert!(unbounded.allows_attempt(u32::MAX - 1));

        let capped = ReconnectPolicy {
            max_attempts: Some(3),
            ..Default::default()
        };
        assert!(capped.allows_attempt(2));
        assert!(!capped.allows_attempt(3));
    }
}
