//! Ledger node abstraction.
//!
//! Everything the core needs from a chain fits in two traits: a
//! [`NodeConnector`] that dials, and the [`LedgerNode`] handle it
//! yields. Both are object-safe so transports can be swapped without
//! touching the rest of the crate; [`crate::devnet`] ships an
//! in-memory pair for tests and local development.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// Status events a node reports for a submitted transaction.
///
/// Nodes may emit them in any order, duplicated or truncated; the
/// lifecycle in [`crate::lifecycle`] makes sense of the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// The transaction made it into a block.
    InBlock,
    /// The block holding the transaction can no longer be reverted.
    Finalized,
    /// The node refused the transaction.
    Rejected { reason: String },
}

/// Stream of [`TxStatus`] events for one submission.
pub type StatusStream = BoxStream<'static, TxStatus>;

/// Profile operation carried by a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileCall {
    /// Store the given username and bio under the caller's address.
    SetProfile { username: String, bio: String },
    /// Delete the record under the caller's address.
    RemoveProfile,
}

/// A call signed by a wallet, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
    pub address: String,
    pub call: ProfileCall,
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    /// The node did not answer the dial at all.
    #[error("node is unreachable")]
    Unreachable,

    /// The node answered but the session could not be established.
    #[error("handshake failed: {reason}")]
    Handshake { reason: String },

    /// An established connection went away mid-operation.
    #[error("connection lost")]
    Disconnected,
}

/// Handle to a connected ledger node.
#[async_trait]
pub trait LedgerNode: Send + Sync {
    /// Reads the raw record stored under `key`. `None` means the
    /// chain holds nothing there, which is not an error.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, NodeError>;

    /// Submits a signed call and returns its status stream. The
    /// stream ends after a terminal status; ending before one is
    /// reported as [`NodeError::Disconnected`] by the caller.
    async fn submit(&self, request: SignedRequest) -> Result<StatusStream, NodeError>;
}

/// Dials a ledger node. Called lazily on first use and again after a
/// failed attempt.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn LedgerNode>, NodeError>;
}
