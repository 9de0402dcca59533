//! Token Operations Module
//!
//! The ledger: per-account balances and the total-supply counter, with the
//! mint, burn and transfer primitives.
//!
//! ## Key Features
//!
//! - **Conservation**: the sum of all balances always equals total supply
//! - **Checked Math**: overflow and underflow fail, never wrap
//! - **Plan / Apply**: every operation is validated into a [`LedgerUpdate`]
//!   before any write, so a rejected call leaves the ledger untouched
//! - **Pause Guard**: every mutation runs [`require_not_paused`] first

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::NULL_ADDRESS;
use crate::emergency::{require_not_paused, PauseSwitch};
use crate::events::{EventLog, TokenEvent};
use crate::types::{is_null, Address, Amount};
use crate::{TokenError, TokenResult};

// ============================================================================
// Types
// ============================================================================

/// Balance map and supply counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Ledger {
    /// Non-zero balances only; absent means zero
    balances: BTreeMap<Address, Amount>,
    /// Total supply of the token
    total_supply: Amount,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account`, zero if never credited
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Total supply
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Accounts with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    /// Number of accounts with a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Sum of every balance, `None` if it does not fit in an [`Amount`]
    pub fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0 as Amount, |acc, balance| acc.checked_add(*balance))
    }

    /// Returns true if balances sum exactly to total supply
    pub fn is_conserved(&self) -> bool {
        self.sum_of_balances() == Some(self.total_supply)
    }

    fn set_balance(&mut self, account: Address, balance: Amount) {
        if balance == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }
}

/// A validated, not yet applied, balance change
///
/// `from` is null for mints and `to` is null for burns; the matching
/// balance slot is then `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpdate {
    /// Debited account
    pub from: Address,
    /// Credited account
    pub to: Address,
    /// Amount moved
    pub amount: Amount,
    /// Debited account's balance after the update
    pub new_from_balance: Option<Amount>,
    /// Credited account's balance after the update
    pub new_to_balance: Option<Amount>,
    /// Total supply after the update
    pub new_total_supply: Amount,
}

// ============================================================================
// Planning (no writes)
// ============================================================================

fn debit(ledger: &Ledger, account: &Address, amount: Amount) -> TokenResult<Amount> {
    let available = ledger.balance_of(account);
    available
        .checked_sub(amount)
        .ok_or(TokenError::InsufficientBalance {
            account: *account,
            available,
            requested: amount,
        })
}

/// Validate a transfer from `from` to `to`
pub fn plan_transfer(
    ledger: &Ledger,
    switch: &PauseSwitch,
    from: Address,
    to: Address,
    amount: Amount,
) -> TokenResult<LedgerUpdate> {
    // 1. Pause guard
    require_not_paused(switch)?;

    // 2. Neither side may be the null account
    if is_null(&from) {
        return Err(TokenError::InvalidSender { sender: from });
    }
    if is_null(&to) {
        return Err(TokenError::InvalidRecipient { recipient: to });
    }

    // 3. Sender must hold the amount
    let new_from_balance = debit(ledger, &from, amount)?;

    // 4. Credit on top of the post-debit balance when sending to self
    let to_before = if from == to {
        new_from_balance
    } else {
        ledger.balance_of(&to)
    };
    let new_to_balance = to_before.checked_add(amount).ok_or(TokenError::Overflow)?;

    Ok(LedgerUpdate {
        from,
        to,
        amount,
        new_from_balance: Some(new_from_balance),
        new_to_balance: Some(new_to_balance),
        new_total_supply: ledger.total_supply,
    })
}

/// Validate minting `amount` to `to`
pub fn plan_mint(
    ledger: &Ledger,
    switch: &PauseSwitch,
    to: Address,
    amount: Amount,
) -> TokenResult<LedgerUpdate> {
    require_not_paused(switch)?;

    if is_null(&to) {
        return Err(TokenError::InvalidRecipient { recipient: to });
    }

    let new_total_supply = ledger
        .total_supply
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;
    let new_to_balance = ledger
        .balance_of(&to)
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;

    Ok(LedgerUpdate {
        from: NULL_ADDRESS,
        to,
        amount,
        new_from_balance: None,
        new_to_balance: Some(new_to_balance),
        new_total_supply,
    })
}

/// Validate burning `amount` from `from`
pub fn plan_burn(
    ledger: &Ledger,
    switch: &PauseSwitch,
    from: Address,
    amount: Amount,
) -> TokenResult<LedgerUpdate> {
    require_not_paused(switch)?;

    if is_null(&from) {
        return Err(TokenError::InvalidSender { sender: from });
    }

    let new_from_balance = debit(ledger, &from, amount)?;
    // Cannot underflow while balances are conserved; checked regardless
    let new_total_supply = ledger
        .total_supply
        .checked_sub(amount)
        .ok_or(TokenError::Overflow)?;

    Ok(LedgerUpdate {
        from,
        to: NULL_ADDRESS,
        amount,
        new_from_balance: Some(new_from_balance),
        new_to_balance: None,
        new_total_supply,
    })
}

// ============================================================================
// Applying
// ============================================================================

/// Commit a planned update and emit its `Transfer` event
///
/// Infallible: all checks happened while planning.
pub fn apply_update(ledger: &mut Ledger, update: LedgerUpdate, events: &mut EventLog) {
    if let Some(balance) = update.new_from_balance {
        ledger.set_balance(update.from, balance);
    }
    if let Some(balance) = update.new_to_balance {
        ledger.set_balance(update.to, balance);
    }
    ledger.total_supply = update.new_total_supply;

    debug!(
        "transfer 0x{} -> 0x{}: {} (supply {})",
        hex::encode(update.from),
        hex::encode(update.to),
        update.amount,
        ledger.total_supply
    );
    events.emit(TokenEvent::Transfer {
        from: update.from,
        to: update.to,
        amount: update.amount,
    });
}

/// Move `amount` from `from` to `to`
pub fn execute_transfer(
    ledger: &mut Ledger,
    switch: &PauseSwitch,
    from: Address,
    to: Address,
    amount: Amount,
    events: &mut EventLog,
) -> TokenResult<()> {
    let update = plan_transfer(ledger, switch, from, to, amount)?;
    apply_update(ledger, update, events);
    Ok(())
}

/// Create `amount` new tokens for `to`
pub fn execute_mint(
    ledger: &mut Ledger,
    switch: &PauseSwitch,
    to: Address,
    amount: Amount,
    events: &mut EventLog,
) -> TokenResult<()> {
    let update = plan_mint(ledger, switch, to, amount)?;
    apply_update(ledger, update, events);
    Ok(())
}

/// Destroy `amount` tokens held by `from`
pub fn execute_burn(
    ledger: &mut Ledger,
    switch: &PauseSwitch,
    from: Address,
    amount: Amount,
    events: &mut EventLog,
) -> TokenResult<()> {
    let update = plan_burn(ledger, switch, from, amount)?;
    apply_update(ledger, update, events);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
