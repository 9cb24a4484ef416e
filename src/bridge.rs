//! Wallet bridge.
//!
//! Keys never enter this crate. Identities are discovered through a
//! [`WalletBridge`] and calls are signed by the [`Signer`] it hands
//! out, so custody stays wherever the wallet lives, whether that is a
//! browser extension or the [`crate::devnet`] stub.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::node::{ProfileCall, SignedRequest};

/// A wallet account as the bridge reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Chain address, the unique key of the identity.
    pub address: String,
    /// Optional human-readable label set in the wallet.
    pub display_name: Option<String>,
}

impl Identity {
    /// Address shortened for labels, keeping `chars` characters on
    /// each side: `5Grwva…GKutQY`.
    pub fn short_address(&self, chars: usize) -> String {
        let len = self.address.chars().count();
        if len <= chars * 2 {
            return self.address.clone();
        }
        let head: String = self.address.chars().take(chars).collect();
        let tail: String = self.address.chars().skip(len - chars).collect();
        format!("{head}…{tail}")
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// No wallet answered, or the user denied the dashboard access.
    #[error("wallet extension is not available")]
    Unavailable,

    /// The wallet holds no signer for this address.
    #[error("unknown address {address}")]
    UnknownAddress { address: String },

    /// The wallet refused to sign.
    #[error("{reason}")]
    Refused { reason: String },
}

/// Access to an external wallet.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    /// Asks the wallet to grant `app_name` access. Must be called
    /// before anything else; wallets typically prompt the user here.
    async fn enable(&self, app_name: &str) -> Result<(), BridgeError>;

    /// Lists the identities the wallet exposes, in wallet order.
    async fn identities(&self) -> Result<Vec<Identity>, BridgeError>;

    /// Returns a signer bound to `address`.
    async fn signer_for(&self, address: &str) -> Result<Arc<dyn Signer>, BridgeError>;
}

/// Signs profile calls on behalf of one identity.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, call: &ProfileCall) -> Result<SignedRequest, BridgeError>;
}
