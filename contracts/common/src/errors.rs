//! Error Types for the ftoken ledger
//!
//! Every rejected call surfaces exactly one of these. Errors are terminal
//! for the call that raised them: no state from that call is committed.

use thiserror::Error;

use crate::types::{Address, Amount, RoleId};

/// Result type alias for ledger operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Main error enum for all token operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    // ============ Address Errors ============
    /// Recipient is the null account
    #[error("invalid recipient 0x{}", hex::encode(.recipient))]
    InvalidRecipient { recipient: Address },

    /// Sender is the null account
    #[error("invalid sender 0x{}", hex::encode(.sender))]
    InvalidSender { sender: Address },

    /// Approval owner is the null account
    #[error("invalid approver 0x{}", hex::encode(.approver))]
    InvalidApprover { approver: Address },

    /// Approved spender is the null account
    #[error("invalid spender 0x{}", hex::encode(.spender))]
    InvalidSpender { spender: Address },

    // ============ Amount Errors ============
    /// Account holds less than the requested amount
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        requested: Amount,
    },

    /// Spender's allowance is below the requested amount
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: Amount,
        requested: Amount,
    },

    /// Checked arithmetic overflowed
    #[error("arithmetic overflow")]
    Overflow,

    // ============ Authorization Errors ============
    /// Caller does not hold the required role
    #[error("account 0x{} is missing role {role}", hex::encode(.account))]
    Unauthorized { account: Address, role: RoleId },

    /// A role can only be renounced by its holder
    #[error("renounce confirmation does not match caller")]
    BadConfirmation,

    // ============ Pause Errors ============
    /// Pause requested while already paused
    #[error("token is already paused")]
    AlreadyPaused,

    /// Unpause requested while not paused
    #[error("token is not paused")]
    NotPaused,

    /// Balance-affecting operation attempted while paused
    #[error("operation rejected: token is paused")]
    OperationPaused,
}

impl TokenError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRecipient { .. } => "E001_INVALID_RECIPIENT",
            Self::InvalidSender { .. } => "E002_INVALID_SENDER",
            Self::InvalidApprover { .. } => "E003_INVALID_APPROVER",
            Self::InvalidSpender { .. } => "E004_INVALID_SPENDER",
            Self::InsufficientBalance { .. } => "E010_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E011_INSUFFICIENT_ALLOWANCE",
            Self::Overflow => "E012_OVERFLOW",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::BadConfirmation => "E021_BAD_CONFIRMATION",
            Self::AlreadyPaused => "E030_ALREADY_PAUSED",
            Self::NotPaused => "E031_NOT_PAUSED",
            Self::OperationPaused => "E032_OPERATION_PAUSED",
        }
    }

    /// Returns true if the caller can succeed by changing its own inputs
    /// (funding the account, raising the allowance, waiting for unpause)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. }
                | Self::InsufficientAllowance { .. }
                | Self::OperationPaused
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            TokenError::InvalidRecipient { recipient: [0u8; 32] },
            TokenError::InvalidSender { sender: [0u8; 32] },
            TokenError::InvalidApprover { approver: [0u8; 32] },
            TokenError::InvalidSpender { spender: [0u8; 32] },
            TokenError::InsufficientBalance { account: [1u8; 32], available: 1, requested: 2 },
            TokenError::InsufficientAllowance {
                owner: [1u8; 32],
                spender: [2u8; 32],
                available: 1,
                requested: 2,
            },
            TokenError::Overflow,
            TokenError::Unauthorized { account: [1u8; 32], role: RoleId::ADMIN },
            TokenError::BadConfirmation,
            TokenError::AlreadyPaused,
            TokenError::NotPaused,
            TokenError::OperationPaused,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_messages_carry_detail() {
        let err = TokenError::InsufficientBalance {
            account: [1u8; 32],
            available: 5,
            requested: 7,
        };
        assert_eq!(err.to_string(), "insufficient balance: available 5, requested 7");

        let err = TokenError::Unauthorized { account: [0xaa; 32], role: RoleId::ADMIN };
        assert!(err.to_string().ends_with("is missing role ADMIN"));
        assert!(err.to_string().contains("0xaaaa"));
    }

    #[test]
    fn test_recoverable() {
        assert!(TokenError::OperationPaused.is_recoverable());
        assert!(!TokenError::AlreadyPaused.is_recoverable());
        assert!(!TokenError::InvalidRecipient { recipient: [0u8; 32] }.is_recoverable());
    }
}
