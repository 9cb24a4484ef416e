use std::time::Duration;

use thiserror::Error;

use crate::bridge::BridgeError;
use crate::node::NodeError;
use crate::profile::DecodeError;

/// Everything that can go wrong between a command and its outcome.
///
/// Display texts are written for people, not logs. They are posted
/// verbatim as notices, so embedders can show them without rewording.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The ledger node could not be reached or dropped us.
    #[error("ledger node connection failed: {0}")]
    Connection(#[from] NodeError),

    /// No wallet extension answered, or it denied access altogether.
    #[error("could not connect to the wallet extension")]
    NoWallet,

    /// The wallet is present but holds no identities.
    #[error("the wallet has no identities; create an account first")]
    NoIdentity,

    /// A stored record exists but does not parse as a profile.
    #[error("stored profile could not be read: {0}")]
    Decode(#[from] DecodeError),

    /// A draft field failed validation before anything was sent.
    #[error("{field} is required")]
    Validation { field: &'static str },

    /// A submission is still in flight; only one may run at a time.
    #[error("a transaction is already in progress")]
    TransactionInProgress,

    /// The node reported the transaction as invalid or dropped.
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    /// The wallet refused to sign, usually because the user dismissed
    /// the prompt.
    #[error("signing failed: {reason}")]
    SigningRefused { reason: String },

    /// No status update arrived within the configured window.
    #[error("no status update within {0:?}")]
    Timeout(Duration),
}

impl From<BridgeError> for Error {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Unavailable => Error::NoWallet,
            BridgeError::Refused { reason } => Error::SigningRefused { reason },
            BridgeError::UnknownAddress { address } => Error::SigningRefused {
                reason: format!("wallet does not know address {address}"),
            },
        }
    }
}
