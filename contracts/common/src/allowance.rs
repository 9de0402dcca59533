//! Allowance Table
//!
//! Delegated spending limits keyed by (owner, spender).
//!
//! `approve` overwrites; it never adds to the previous value and never
//! looks at the owner's balance. A spender watching for a changed approval
//! can spend the old value first and then the new one. That race belongs to
//! the token standard being modeled and is kept as is.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::allowance::UNLIMITED;
use crate::events::{EventLog, TokenEvent};
use crate::types::{is_null, Address, Amount};
use crate::{TokenError, TokenResult};

/// Per-(owner, spender) spending limits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AllowanceTable {
    /// Non-zero entries only
    entries: BTreeMap<(Address, Address), Amount>,
    /// Treat [`UNLIMITED`] as never decremented
    unlimited_sentinel: bool,
}

/// A validated allowance decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceSpend {
    pub owner: Address,
    pub spender: Address,
    /// Allowance left after the spend; `None` for an unlimited entry
    pub remaining: Option<Amount>,
}

impl AllowanceTable {
    /// Create a table where every entry is finite
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table that honors the unlimited sentinel
    pub fn with_unlimited_sentinel(enabled: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            unlimited_sentinel: enabled,
        }
    }

    /// Returns true if [`UNLIMITED`] entries skip decrement
    pub fn unlimited_sentinel(&self) -> bool {
        self.unlimited_sentinel
    }

    /// Current allowance, zero by default
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.entries.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Number of non-zero entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no allowance is outstanding
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.entries.remove(&(owner, spender));
        } else {
            self.entries.insert((owner, spender), amount);
        }
    }
}

fn check_parties(owner: &Address, spender: &Address) -> TokenResult<()> {
    if is_null(owner) {
        return Err(TokenError::InvalidApprover { approver: *owner });
    }
    if is_null(spender) {
        return Err(TokenError::InvalidSpender { spender: *spender });
    }
    Ok(())
}

fn set_and_emit(
    table: &mut AllowanceTable,
    owner: Address,
    spender: Address,
    amount: Amount,
    events: &mut EventLog,
) {
    table.set(owner, spender, amount);
    debug!(
        "approval 0x{} -> 0x{}: {}",
        hex::encode(owner),
        hex::encode(spender),
        amount
    );
    events.emit(TokenEvent::Approval { owner, spender, amount });
}

/// Set the allowance of `spender` over `owner`'s balance to `amount`
pub fn approve(
    table: &mut AllowanceTable,
    owner: Address,
    spender: Address,
    amount: Amount,
    events: &mut EventLog,
) -> TokenResult<()> {
    check_parties(&owner, &spender)?;
    set_and_emit(table, owner, spender, amount, events);
    Ok(())
}

/// Raise the allowance by `added`
pub fn increase_allowance(
    table: &mut AllowanceTable,
    owner: Address,
    spender: Address,
    added: Amount,
    events: &mut EventLog,
) -> TokenResult<Amount> {
    check_parties(&owner, &spender)?;
    let amount = table
        .allowance(&owner, &spender)
        .checked_add(added)
        .ok_or(TokenError::Overflow)?;
    set_and_emit(table, owner, spender, amount, events);
    Ok(amount)
}

/// Lower the allowance by `subtracted`; going below zero is an error
pub fn decrease_allowance(
    table: &mut AllowanceTable,
    owner: Address,
    spender: Address,
    subtracted: Amount,
    events: &mut EventLog,
) -> TokenResult<Amount> {
    check_parties(&owner, &spender)?;
    let available = table.allowance(&owner, &spender);
    let amount = available
        .checked_sub(subtracted)
        .ok_or(TokenError::InsufficientAllowance {
            owner,
            spender,
            available,
            requested: subtracted,
        })?;
    set_and_emit(table, owner, spender, amount, events);
    Ok(amount)
}

/// Validate spending `amount` of `owner`'s allowance to `spender`
pub fn plan_spend(
    table: &AllowanceTable,
    owner: Address,
    spender: Address,
    amount: Amount,
) -> TokenResult<AllowanceSpend> {
    let available = table.allowance(&owner, &spender);

    if table.unlimited_sentinel && available == UNLIMITED {
        return Ok(AllowanceSpend { owner, spender, remaining: None });
    }

    let remaining = available
        .checked_sub(amount)
        .ok_or(TokenError::InsufficientAllowance {
            owner,
            spender,
            available,
            requested: amount,
        })?;

    Ok(AllowanceSpend {
        owner,
        spender,
        remaining: Some(remaining),
    })
}

/// Commit a planned decrement. Spending emits no `Approval`.
pub fn apply_spend(table: &mut AllowanceTable, spend: AllowanceSpend) {
    if let Some(remaining) = spend.remaining {
        table.set(spend.owner, spend.spender, remaining);
    }
}

/// Check and decrement in one step
pub fn spend(
    table: &mut AllowanceTable,
    owner: Address,
    spender: Address,
    amount: Amount,
) -> TokenResult<()> {
    let planned = plan_spend(table, owner, spender, amount)?;
    apply_spend(table, planned);
    Ok(())
}
