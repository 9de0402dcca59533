//! Emergency Module
//!
//! The pause switch: a single process-wide flag that freezes every
//! balance-affecting operation. Approvals and role management stay open.
//!
//! Transitions are guarded: pausing a paused token or unpausing an active
//! one is an error, never a silent no-op. Callers are expected to check the
//! admin role before calling [`pause`] or [`unpause`].

use borsh::{BorshDeserialize, BorshSerialize};
use log::info;
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, TokenEvent};
use crate::types::{Address, PauseState};
use crate::{TokenError, TokenResult};

/// Pause switch state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PauseSwitch {
    state: PauseState,
}

impl PauseSwitch {
    /// Create an active (unpaused) switch
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> PauseState {
        self.state
    }

    /// Returns true while paused
    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }
}

/// Fail with `OperationPaused` while the switch is engaged
///
/// This is the single before-update guard run ahead of every transfer,
/// mint and burn.
pub fn require_not_paused(switch: &PauseSwitch) -> TokenResult<()> {
    if switch.is_paused() {
        return Err(TokenError::OperationPaused);
    }
    Ok(())
}

/// Engage the switch: `Active -> Paused`
pub fn pause(switch: &mut PauseSwitch, by: Address, events: &mut EventLog) -> TokenResult<()> {
    if switch.is_paused() {
        return Err(TokenError::AlreadyPaused);
    }

    switch.state = PauseState::Paused;
    info!("token paused by 0x{}", hex::encode(by));
    events.emit(TokenEvent::Paused { by });
    Ok(())
}

/// Release the switch: `Paused -> Active`
pub fn unpause(switch: &mut PauseSwitch, by: Address, events: &mut EventLog) -> TokenResult<()> {
    if !switch.is_paused() {
        return Err(TokenError::NotPaused);
    }

    switch.state = PauseState::Active;
    info!("token unpaused by 0x{}", hex::encode(by));
    events.emit(TokenEvent::Unpaused { by });
    Ok(())
}
