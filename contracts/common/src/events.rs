//! Token Events
//!
//! Notifications produced by committed state changes. Components append
//! to an [`EventLog`] only after their writes are applied, so a failed call
//! never leaves an event behind.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, RoleId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Ledger Events (0x01 - 0x1F)
    Transfer = 0x01,
    Approval = 0x02,

    // Pause Events (0x20 - 0x3F)
    Paused = 0x20,
    Unpaused = 0x21,

    // Access Events (0x40 - 0x5F)
    RoleGranted = 0x40,
    RoleRevoked = 0x41,
}

/// Main event enum containing every notification the token emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TokenEvent {
    /// Balance moved; `from` is null for mints, `to` is null for burns
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },

    /// Allowance set to `amount`
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },

    /// Pause switch engaged
    Paused { by: Address },

    /// Pause switch released
    Unpaused { by: Address },

    /// `account` now holds `role`
    RoleGranted {
        role: RoleId,
        account: Address,
        sender: Address,
    },

    /// `account` no longer holds `role`
    RoleRevoked {
        role: RoleId,
        account: Address,
        sender: Address,
    },
}

impl TokenEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Transfer { .. } => EventType::Transfer,
            Self::Approval { .. } => EventType::Approval,
            Self::Paused { .. } => EventType::Paused,
            Self::Unpaused { .. } => EventType::Unpaused,
            Self::RoleGranted { .. } => EventType::RoleGranted,
            Self::RoleRevoked { .. } => EventType::RoleRevoked,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Ordered log of events emitted by committed operations
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<TokenEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: TokenEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<TokenEvent> {
        self.events
    }

    /// Remove and return every event emitted at or after `mark`
    pub fn drain_from(&mut self, mark: usize) -> Vec<TokenEvent> {
        let start = mark.min(self.events.len());
        self.events.drain(start..).collect()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&TokenEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the most recent event
    pub fn last(&self) -> Option<&TokenEvent> {
        self.events.last()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = TokenEvent::Approval {
            owner: [1u8; 32],
            spender: [2u8; 32],
            amount: 10,
        };
        assert_eq!(event.event_type(), EventType::Approval);
        assert_eq!(TokenEvent::Paused { by: [1u8; 32] }.event_type(), EventType::Paused);
    }

    #[test]
    fn test_event_bytes() {
        let event = TokenEvent::Transfer {
            from: [1u8; 32],
            to: [2u8; 32],
            amount: u128::MAX,
        };
        let restored = TokenEvent::from_bytes(&event.to_bytes()).unwrap();
        assert_eq!(event, restored);
        assert!(TokenEvent::from_bytes(&[0xff]).is_none());
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.emit(TokenEvent::Paused { by: [1u8; 32] });
        log.emit(TokenEvent::Transfer { from: [0u8; 32], to: [2u8; 32], amount: 5 });
        log.emit(TokenEvent::Unpaused { by: [1u8; 32] });

        assert_eq!(log.len(), 3);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::Transfer).len(), 1);
        assert_eq!(log.last(), Some(&TokenEvent::Unpaused { by: [1u8; 32] }));

        let tail = log.drain_from(1);
        assert_eq!(tail.len(), 2);
        assert_eq!(log.len(), 1);
        assert!(log.drain_from(10).is_empty());
    }
}
