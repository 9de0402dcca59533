//! Text Formats
//!
//! Parsing and rendering of addresses, amounts, roles and events for the
//! command line.

use ftoken_common::{
    capabilities::{Capability, InterfaceId},
    constants::token,
    Address, Amount, RoleId, TokenEvent,
};
use thiserror::Error;

/// Errors raised while parsing user input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid address '{0}': expected 32 bytes of hex")]
    Address(String),

    #[error("invalid amount '{0}'")]
    Amount(String),

    #[error("amount '{0}' has more than {1} decimal places")]
    Precision(String, u8),

    #[error("invalid role '{0}'")]
    Role(String),

    #[error("unknown capability '{0}'")]
    Capability(String),
}

fn decode_hex32(input: &str) -> Option<[u8; 32]> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(digits).ok()?;
    bytes.try_into().ok()
}

/// Parse a 32-byte hex address, with or without `0x`
pub fn parse_address(input: &str) -> Result<Address, ParseError> {
    decode_hex32(input).ok_or_else(|| ParseError::Address(input.to_string()))
}

/// Render an address as `0x`-prefixed hex
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Parse an amount in whole tokens, e.g. `12.5`, into base units
pub fn parse_amount(input: &str) -> Result<Amount, ParseError> {
    let invalid = || ParseError::Amount(input.to_string());
    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.len() > token::DECIMALS as usize {
        return Err(ParseError::Precision(input.to_string(), token::DECIMALS));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let whole: Amount = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let scale = 10u128.pow(token::DECIMALS as u32 - fraction.len() as u32);
    let fraction: Amount = if fraction.is_empty() { 0 } else { fraction.parse().map_err(|_| invalid())? };

    whole
        .checked_mul(token::ONE)
        .and_then(|w| w.checked_add(fraction * scale))
        .ok_or_else(invalid)
}

/// Split base units into whole tokens and the fractional remainder
pub fn split_amount(amount: Amount) -> (Amount, Amount) {
    (amount / token::ONE, amount % token::ONE)
}

/// Render base units as whole tokens with trailing zeros trimmed
pub fn format_amount(amount: Amount) -> String {
    let (whole, fractional) = split_amount(amount);
    if fractional == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fractional, width = token::DECIMALS as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a role: `admin`, a 32-byte hex id, or a role name to hash
pub fn parse_role(input: &str) -> Result<RoleId, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Role(input.to_string()));
    }
    if trimmed.eq_ignore_ascii_case("admin") {
        return Ok(RoleId::ADMIN);
    }
    Ok(decode_hex32(trimmed).map(RoleId).unwrap_or_else(|| RoleId::named(trimmed)))
}

/// Parse a capability tag (`burnable`) or a 4-byte hex interface id
pub fn parse_interface(input: &str) -> Result<InterfaceId, ParseError> {
    if let Some(capability) = Capability::from_tag(input) {
        return Ok(capability.interface_id());
    }
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| ParseError::Capability(input.to_string()))
}

/// One-line description of an event
pub fn describe_event(event: &TokenEvent) -> String {
    match event {
        TokenEvent::Transfer { from, to, amount } => format!(
            "Transfer(from={}, to={}, amount={})",
            format_address(from),
            format_address(to),
            format_amount(*amount)
        ),
        TokenEvent::Approval { owner, spender, amount } => format!(
            "Approval(owner={}, spender={}, amount={})",
            format_address(owner),
            format_address(spender),
            format_amount(*amount)
        ),
        TokenEvent::Paused { by } => format!("Paused(by={})", format_address(by)),
        TokenEvent::Unpaused { by } => format!("Unpaused(by={})", format_address(by)),
        TokenEvent::RoleGranted { role, account, sender } => format!(
            "RoleGranted(role={}, account={}, sender={})",
            role,
            format_address(account),
            format_address(sender)
        ),
        TokenEvent::RoleRevoked { role, account, sender } => format!(
            "RoleRevoked(role={}, account={}, sender={})",
            role,
            format_address(account),
            format_address(sender)
        ),
    }
}
