//! In-memory wallet and ledger for tests and local development.
//!
//! [`DevWallet`] plays the wallet extension and [`DevNode`] plays the
//! chain. The node answers submissions according to a [`Script`], so
//! rejected, stalling and truncated transactions are as easy to stage
//! as confirmed ones. Records live in a plain map; a finalized
//! submission is applied to the map right before the `Finalized`
//! status goes out, the way a real chain makes writes visible.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::bridge::{BridgeError, Identity, Signer, WalletBridge};
use crate::node::{
    LedgerNode, NodeConnector, NodeError, ProfileCall, SignedRequest, StatusStream, TxStatus,
};
use crate::profile::{self, Profile, ProfileRecord};

/// A wallet holding identities without keys.
///
/// Signers it hands out produce placeholder signatures; the devnet
/// node does not verify them.
pub struct DevWallet {
    identities: Mutex<Vec<Identity>>,
    enabled_by: Mutex<Vec<String>>,
    available: bool,
    refusal: Option<String>,
    sign_delay: Duration,
}

impl DevWallet {
    pub fn new() -> DevWallet {
        DevWallet {
            identities: Mutex::new(Vec::new()),
            enabled_by: Mutex::new(Vec::new()),
            available: true,
            refusal: None,
            sign_delay: Duration::ZERO,
        }
    }

    /// A wallet that behaves as if no extension were installed.
    pub fn unavailable() -> DevWallet {
        DevWallet {
            available: false,
            ..DevWallet::new()
        }
    }

    /// Adds an identity to the wallet, keeping insertion order.
    pub fn with_identity(self, address: &str, display_name: Option<&str>) -> DevWallet {
        self.identities.lock().unwrap().push(Identity {
            address: address.to_string(),
            display_name: display_name.map(str::to_string),
        });
        self
    }

    /// Makes every signing request fail with `reason`.
    pub fn refusing(mut self, reason: &str) -> DevWallet {
        self.refusal = Some(reason.to_string());
        self
    }

    /// Every signing request waits this long before answering, like a
    /// wallet holding its confirmation prompt open.
    pub fn with_sign_delay(mut self, delay: Duration) -> DevWallet {
        self.sign_delay = delay;
        self
    }

    /// Replaces the identity list, as if accounts were added or
    /// removed in the extension.
    pub fn set_identities(&self, identities: Vec<Identity>) {
        *self.identities.lock().unwrap() = identities;
    }

    /// Application names that asked for access so far.
    pub fn enabled_by(&self) -> Vec<String> {
        self.enabled_by.lock().unwrap().clone()
    }
}

impl Default for DevWallet {
    fn default() -> DevWallet {
        DevWallet::new()
    }
}

#[async_trait]
impl WalletBridge for DevWallet {
    async fn enable(&self, app_name: &str) -> Result<(), BridgeError> {
        if !self.available {
            return Err(BridgeError::Unavailable);
        }
        self.enabled_by.lock().unwrap().push(app_name.to_string());
        Ok(())
    }

    async fn identities(&self) -> Result<Vec<Identity>, BridgeError> {
        if !self.available {
            return Err(BridgeError::Unavailable);
        }
        Ok(self.identities.lock().unwrap().clone())
    }

    async fn signer_for(&self, address: &str) -> Result<Arc<dyn Signer>, BridgeError> {
        let known = self
            .identities
            .lock()
            .unwrap()
            .iter()
            .any(|identity| identity.address == address);
        if !known {
            return Err(BridgeError::UnknownAddress {
                address: address.to_string(),
            });
        }
        Ok(Arc::new(DevSigner {
            address: address.to_string(),
            refusal: self.refusal.clone(),
            delay: self.sign_delay,
        }))
    }
}

/// Signer handed out by [`DevWallet`].
pub struct DevSigner {
    address: String,
    refusal: Option<String>,
    delay: Duration,
}

#[async_trait]
impl Signer for DevSigner {
    async fn sign(&self, call: &ProfileCall) -> Result<SignedRequest, BridgeError> {
        tokio::time::sleep(self.delay).await;
        if let Some(reason) = &self.refusal {
            return Err(BridgeError::Refused {
                reason: reason.clone(),
            });
        }
        Ok(SignedRequest {
            address: self.address.clone(),
            call: call.clone(),
            signature: format!("devnet:{}", self.address).into_bytes(),
        })
    }
}

/// How [`DevNode`] answers a submission.
#[derive(Clone, Debug)]
pub enum Script {
    /// Include the transaction in a block, then finalize it.
    Confirm,
    /// Reject the transaction with the given reason.
    Reject(String),
    /// Emit exactly these statuses, then end the stream.
    Emit(Vec<TxStatus>),
    /// Emit these statuses, then stay silent with the stream open.
    Stall(Vec<TxStatus>),
}

/// An in-memory ledger node.
pub struct DevNode {
    records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    submissions: Mutex<Vec<SignedRequest>>,
    reads: Mutex<Vec<String>>,
    script: Mutex<Script>,
    read_delay: Duration,
    status_delay: Duration,
}

impl DevNode {
    pub fn new() -> DevNode {
        DevNode {
            records: Arc::new(Mutex::new(HashMap::new())),
            submissions: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
            script: Mutex::new(Script::Confirm),
            read_delay: Duration::ZERO,
            status_delay: Duration::ZERO,
        }
    }

    /// Seeds a stored profile for `address`.
    pub fn with_profile(self, address: &str, username: &str, bio: &str) -> DevNode {
        let profile = Profile {
            username: username.to_string(),
            bio: bio.to_string(),
        };
        self.records
            .lock()
            .unwrap()
            .insert(profile::storage_key(address), profile::encode_record(&profile));
        self
    }

    /// Seeds raw bytes under `address`'s profile key, bypassing the
    /// record encoding. For staging foreign or corrupt data.
    pub fn with_raw_record(self, address: &str, raw: &[u8]) -> DevNode {
        self.records
            .lock()
            .unwrap()
            .insert(profile::storage_key(address), raw.to_vec());
        self
    }

    /// Sets how submissions are answered.
    pub fn with_script(self, script: Script) -> DevNode {
        *self.script.lock().unwrap() = script;
        self
    }

    /// Every storage read waits this long before answering.
    pub fn with_read_delay(mut self, delay: Duration) -> DevNode {
        self.read_delay = delay;
        self
    }

    /// Pause before each status event of a submission.
    pub fn with_status_delay(mut self, delay: Duration) -> DevNode {
        self.status_delay = delay;
        self
    }

    /// Changes the script for submissions that follow.
    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// The profile currently stored under `address`, if any.
    pub fn stored_profile(&self, address: &str) -> Option<Profile> {
        let records = self.records.lock().unwrap();
        let raw = records.get(&profile::storage_key(address))?;
        match profile::decode_record(Some(raw)) {
            Ok(ProfileRecord::Found(profile)) => Some(profile),
            _ => None,
        }
    }

    /// Every request submitted so far, oldest first.
    pub fn submissions(&self) -> Vec<SignedRequest> {
        self.submissions.lock().unwrap().clone()
    }

    /// Every storage key read so far, oldest first.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl Default for DevNode {
    fn default() -> DevNode {
        DevNode::new()
    }
}

#[async_trait]
impl LedgerNode for DevNode {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, NodeError> {
        self.reads.lock().unwrap().push(key.to_string());
        tokio::time::sleep(self.read_delay).await;
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn submit(&self, request: SignedRequest) -> Result<StatusStream, NodeError> {
        self.submissions.lock().unwrap().push(request.clone());
        let script = self.script.lock().unwrap().clone();
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(run_script(
            script,
            request,
            self.records.clone(),
            self.status_delay,
            tx,
        ));
        Ok(ReceiverStream::new(rx).boxed())
    }
}

async fn run_script(
    script: Script,
    request: SignedRequest,
    records: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    pace: Duration,
    tx: mpsc::Sender<TxStatus>,
) {
    let (statuses, stall) = match script {
        Script::Confirm => (vec![TxStatus::InBlock, TxStatus::Finalized], false),
        Script::Reject(reason) => (vec![TxStatus::Rejected { reason }], false),
        Script::Emit(statuses) => (statuses, false),
        Script::Stall(statuses) => (statuses, true),
    };

    for status in statuses {
        tokio::time::sleep(pace).await;
        if status == TxStatus::Finalized {
            apply_call(&records, &request);
        }
        if tx.send(status).await.is_err() {
            // Stream dropped, nobody is listening anymore.
            return;
        }
    }

    if stall {
        // Keep the channel open so the stream never ends on its own.
        tx.closed().await;
    }
}

fn apply_call(records: &Mutex<HashMap<String, Vec<u8>>>, request: &SignedRequest) {
    let key = profile::storage_key(&request.address);
    let mut records = records.lock().unwrap();
    match &request.call {
        ProfileCall::SetProfile { username, bio } => {
            let profile = Profile {
                username: username.clone(),
                bio: bio.clone(),
            };
            records.insert(key, profile::encode_record(&profile));
        }
        ProfileCall::RemoveProfile => {
            records.remove(&key);
        }
    }
}

/// Connector yielding a shared [`DevNode`], counting dials and
/// optionally failing the first few.
pub struct DevConnector {
    node: Arc<DevNode>,
    dials: AtomicUsize,
    failures_left: AtomicUsize,
}

impl DevConnector {
    pub fn new(node: Arc<DevNode>) -> DevConnector {
        DevConnector {
            node,
            dials: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Makes the next `n` dials fail before connections succeed.
    pub fn failing_dials(self, n: usize) -> DevConnector {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Number of dials attempted so far.
    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeConnector for DevConnector {
    async fn connect(&self) -> Result<Arc<dyn LedgerNode>, NodeError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(NodeError::Unreachable);
        }
        Ok(self.node.clone())
    }
}
