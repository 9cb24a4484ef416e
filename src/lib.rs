//! Headless core of an on-chain profile dashboard.
//!
//! Chainfolio owns everything between a user interface and the chain:
//! wallet identity discovery, reading the stored profile, signed
//! submissions with their Idle → Submitting → Included → Finalized
//! lifecycle, and the notices that tell the person what happened.
//! It draws no pixels; embedders bind its watch channels to whatever
//! toolkit they use.

pub mod bridge;
pub mod chain;
pub mod chainfolio;
pub mod config;
pub mod devnet;
pub mod error;
pub mod lifecycle;
pub mod node;
pub mod notify;
pub mod profile;
pub mod session;

pub use crate::bridge::{BridgeError, Identity, Signer, WalletBridge};
pub use crate::chainfolio::Chainfolio;
pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::lifecycle::{TxKind, TxPhase};
pub use crate::node::{
    LedgerNode, NodeConnector, NodeError, ProfileCall, SignedRequest, StatusStream, TxStatus,
};
pub use crate::notify::{Notice, Notifier, Severity};
pub use crate::profile::{Draft, Profile, ProfileState};

/// Installs a compact tracing subscriber honoring `RUST_LOG`.
///
/// Strictly optional; embedders with their own subscriber should not
/// call it. Calling it twice keeps the first subscriber.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .compact()
        .with_max_level(tracing::Level::TRACE)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
