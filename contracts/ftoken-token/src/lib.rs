//! ftoken Token Contract
//!
//! The public surface of the token: a pausable, burnable fungible token
//! with role-based access control. [`FungibleToken`] owns the ledger, the
//! allowance table, the role registry and the pause switch, and routes
//! every call through the right guards before it touches state.
//!
//! | Operation | Auth | Paused? |
//! |---|---|---|
//! | `transfer` | caller is sender | rejected |
//! | `approve` / `increase_allowance` / `decrease_allowance` | caller is owner | allowed |
//! | `transfer_from` / `burn_from` | allowance | rejected |
//! | `mint` | admin role | rejected |
//! | `burn` | caller's own balance | rejected |
//! | `pause` / `unpause` | admin role | n/a |
//! | `grant_role` / `revoke_role` | role's admin | allowed |
//!
//! For concurrent use wrap the token in a [`SharedToken`].

use ftoken_common::{
    access_control, allowance,
    capabilities::{self, Capability, InterfaceId},
    constants::token,
    emergency,
    events::{EventLog, TokenEvent},
    storage::Snapshot,
    token_ops, AccessRegistry, Address, AllowanceTable, Amount, Ledger, PauseSwitch, RoleId,
    TokenResult,
};
use log::debug;

pub mod config;
pub mod export;
pub mod format;
pub mod shared;

pub use config::{ConfigError, TokenConfig};
pub use shared::{EventObserver, SharedToken};

// ============ Token State ============

/// A single fungible token
///
/// Every committed call appends to an in-memory event log that is never
/// trimmed on its own. Callers holding a token for many calls must take the
/// events with [`FungibleToken::drain_events`] (or
/// [`FungibleToken::drain_events_from`]); [`SharedToken`] does this after
/// every call.
#[derive(Debug, Clone)]
pub struct FungibleToken {
    name: String,
    symbol: String,
    ledger: Ledger,
    allowances: AllowanceTable,
    access: AccessRegistry,
    pause: PauseSwitch,
    events: EventLog,
}

fn rejected<T>(op: &str, result: TokenResult<T>) -> TokenResult<T> {
    if let Err(err) = &result {
        debug!("{} rejected: {} ({})", op, err, err.code());
    }
    result
}

impl FungibleToken {
    /// Deploy with the default initial supply
    ///
    /// `deployer` receives the admin role and the entire initial supply.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, deployer: Address) -> TokenResult<Self> {
        Self::with_config(&TokenConfig::with_metadata(name, symbol), deployer)
    }

    /// Deploy from a configuration
    pub fn with_config(config: &TokenConfig, deployer: Address) -> TokenResult<Self> {
        let mut token = Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            ledger: Ledger::new(),
            allowances: AllowanceTable::with_unlimited_sentinel(config.unlimited_allowance),
            access: AccessRegistry::new(deployer),
            pause: PauseSwitch::new(),
            events: EventLog::new(),
        };

        token_ops::execute_mint(
            &mut token.ledger,
            &token.pause,
            deployer,
            config.initial_supply,
            &mut token.events,
        )?;

        debug!(
            "deployed {} ({}) with supply {}",
            token.name, token.symbol, config.initial_supply
        );
        Ok(token)
    }

    /// Rebuild a token from persisted state; the event log starts empty
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            name: snapshot.name,
            symbol: snapshot.symbol,
            ledger: snapshot.ledger,
            allowances: snapshot.allowances,
            access: snapshot.access,
            pause: snapshot.pause,
            events: EventLog::new(),
        }
    }

    /// Capture the full persisted state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            ledger: self.ledger.clone(),
            allowances: self.allowances.clone(),
            access: self.access.clone(),
            pause: self.pause,
        }
    }

    // ============ Metadata & Views ============

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        token::DECIMALS
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.allowance(owner, spender)
    }

    pub fn paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn has_role(&self, role: RoleId, account: &Address) -> bool {
        self.access.has_role(role, account)
    }

    pub fn role_admin(&self, role: RoleId) -> RoleId {
        self.access.role_admin(role)
    }

    pub fn role_members(&self, role: RoleId) -> Vec<Address> {
        self.access.members(role).copied().collect()
    }

    /// Non-zero balances
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        self.ledger.holders().map(|(a, b)| (*a, *b)).collect()
    }

    /// Returns true if balances sum exactly to total supply
    pub fn check_invariants(&self) -> bool {
        self.ledger.is_conserved()
    }

    // ============ Introspection ============

    pub fn supports_interface(&self, id: InterfaceId) -> bool {
        capabilities::supports_interface(id)
    }

    pub fn supports_capability(&self, capability: Capability) -> bool {
        capabilities::supports_capability(capability)
    }

    // ============ Events ============

    /// Events emitted since construction (or the last drain)
    ///
    /// The log only shrinks when drained.
    pub fn events(&self) -> &[TokenEvent] {
        self.events.events()
    }

    /// Number of events currently held
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Remove and return events emitted at or after `mark`
    pub fn drain_events_from(&mut self, mark: usize) -> Vec<TokenEvent> {
        self.events.drain_from(mark)
    }

    /// Remove and return every held event
    pub fn drain_events(&mut self) -> Vec<TokenEvent> {
        self.events.drain_from(0)
    }

    // ============ Ledger Operations ============

    /// Move `amount` from the caller to `to`
    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> TokenResult<()> {
        rejected(
            "transfer",
            token_ops::execute_transfer(&mut self.ledger, &self.pause, caller, to, amount, &mut self.events),
        )
    }

    /// Let `spender` move up to `amount` of the caller's balance
    pub fn approve(&mut self, caller: Address, spender: Address, amount: Amount) -> TokenResult<()> {
        rejected(
            "approve",
            allowance::approve(&mut self.allowances, caller, spender, amount, &mut self.events),
        )
    }

    /// Raise `spender`'s allowance; returns the new value
    pub fn increase_allowance(&mut self, caller: Address, spender: Address, added: Amount) -> TokenResult<Amount> {
        rejected(
            "increase_allowance",
            allowance::increase_allowance(&mut self.allowances, caller, spender, added, &mut self.events),
        )
    }

    /// Lower `spender`'s allowance; returns the new value
    pub fn decrease_allowance(&mut self, caller: Address, spender: Address, subtracted: Amount) -> TokenResult<Amount> {
        rejected(
            "decrease_allowance",
            allowance::decrease_allowance(&mut self.allowances, caller, spender, subtracted, &mut self.events),
        )
    }

    /// Move `amount` from `from` to `to` using the caller's allowance
    ///
    /// The allowance is checked before the balance: a caller short on both
    /// sees `InsufficientAllowance`. Nothing is written unless both pass.
    pub fn transfer_from(&mut self, caller: Address, from: Address, to: Address, amount: Amount) -> TokenResult<()> {
        let result = self.spend_and_transfer(caller, from, to, amount);
        rejected("transfer_from", result)
    }

    /// Create `amount` tokens for `to`; admin only
    pub fn mint(&mut self, caller: Address, to: Address, amount: Amount) -> TokenResult<()> {
        let result = access_control::require_role(&self.access, RoleId::ADMIN, &caller).and_then(|()| {
            token_ops::execute_mint(&mut self.ledger, &self.pause, to, amount, &mut self.events)
        });
        rejected("mint", result)
    }

    /// Destroy `amount` of the caller's own balance
    pub fn burn(&mut self, caller: Address, amount: Amount) -> TokenResult<()> {
        rejected(
            "burn",
            token_ops::execute_burn(&mut self.ledger, &self.pause, caller, amount, &mut self.events),
        )
    }

    /// Destroy `amount` of `account`'s balance using the caller's allowance
    pub fn burn_from(&mut self, caller: Address, account: Address, amount: Amount) -> TokenResult<()> {
        let result = self.spend_and_burn(caller, account, amount);
        rejected("burn_from", result)
    }

    fn spend_and_transfer(&mut self, spender: Address, from: Address, to: Address, amount: Amount) -> TokenResult<()> {
        let spend = allowance::plan_spend(&self.allowances, from, spender, amount)?;
        let update = token_ops::plan_transfer(&self.ledger, &self.pause, from, to, amount)?;
        allowance::apply_spend(&mut self.allowances, spend);
        token_ops::apply_update(&mut self.ledger, update, &mut self.events);
        Ok(())
    }

    fn spend_and_burn(&mut self, spender: Address, account: Address, amount: Amount) -> TokenResult<()> {
        let spend = allowance::plan_spend(&self.allowances, account, spender, amount)?;
        let update = token_ops::plan_burn(&self.ledger, &self.pause, account, amount)?;
        allowance::apply_spend(&mut self.allowances, spend);
        token_ops::apply_update(&mut self.ledger, update, &mut self.events);
        Ok(())
    }

    // ============ Admin Operations ============

    /// Freeze transfers, mints and burns; admin only
    pub fn pause(&mut self, caller: Address) -> TokenResult<()> {
        let result = access_control::require_role(&self.access, RoleId::ADMIN, &caller)
            .and_then(|()| emergency::pause(&mut self.pause, caller, &mut self.events));
        rejected("pause", result)
    }

    /// Lift the freeze; admin only
    pub fn unpause(&mut self, caller: Address) -> TokenResult<()> {
        let result = access_control::require_role(&self.access, RoleId::ADMIN, &caller)
            .and_then(|()| emergency::unpause(&mut self.pause, caller, &mut self.events));
        rejected("unpause", result)
    }

    /// Grant `role` to `account`; the caller must hold the role's admin
    pub fn grant_role(&mut self, caller: Address, role: RoleId, account: Address) -> TokenResult<bool> {
        rejected(
            "grant_role",
            access_control::grant_role(&mut self.access, caller, role, account, &mut self.events),
        )
    }

    /// Revoke `role` from `account`; the caller must hold the role's admin
    pub fn revoke_role(&mut self, caller: Address, role: RoleId, account: Address) -> TokenResult<bool> {
        rejected(
            "revoke_role",
            access_control::revoke_role(&mut self.access, caller, role, account, &mut self.events),
        )
    }

    /// Drop one of the caller's own roles
    pub fn renounce_role(&mut self, caller: Address, role: RoleId, confirmation: Address) -> TokenResult<bool> {
        rejected(
            "renounce_role",
            access_control::renounce_role(&mut self.access, caller, role, confirmation, &mut self.events),
        )
    }
}

// ============ Tests ============
