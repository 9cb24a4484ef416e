//! The dashboard core.
//!
//! [`Chainfolio`] is the only thing an embedder talks to. Commands go
//! in, watch channels come out: active identity, profile state,
//! submission phase and notices. Everything long-running happens on
//! spawned tasks, so commands return as soon as the outcome is
//! determined or handed to the chain.

use std::fmt::Debug;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::bridge::{Identity, WalletBridge};
use crate::chain::Chain;
use crate::config::Config;
use crate::error::Error;
use crate::lifecycle::{TxKind, TxPhase};
use crate::node::{NodeConnector, NodeError, ProfileCall, SignedRequest, StatusStream, TxStatus};
use crate::notify::{Notice, Notifier, Severity};
use crate::profile::{self, Draft, ProfileRecord, ProfileState};
use crate::session::Session;

/// A dashboard session. Everything the dashboard does goes through an
/// instance of this; clones share the session.
#[derive(Clone)]
pub struct Chainfolio(Arc<ChainfolioInner>);

impl Debug for Chainfolio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Chainfolio").field(&self.0.config.app_name).finish()
    }
}

struct ChainfolioInner {
    config: Config,
    bridge: Arc<dyn WalletBridge>,
    chain: Chain,
    session: Session,
    notifier: Notifier,
    profile: watch::Sender<ProfileState>,
    phase: watch::Sender<TxPhase>,
}

impl Chainfolio {
    pub fn new(
        config: Config,
        bridge: Arc<dyn WalletBridge>,
        connector: Arc<dyn NodeConnector>,
    ) -> Chainfolio {
        let (profile, _) = watch::channel(ProfileState::default());
        let (phase, _) = watch::channel(TxPhase::default());
        Chainfolio(Arc::new(ChainfolioInner {
            notifier: Notifier::new(config.notice_ttl()),
            chain: Chain::new(connector),
            session: Session::new(),
            bridge,
            profile,
            phase,
            config,
        }))
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn session(&self) -> &Session {
        &self.0.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.0.notifier
    }

    /// Watch channel following the active identity.
    pub fn identity(&self) -> watch::Receiver<Option<Identity>> {
        self.0.session.watch()
    }

    /// Watch channel following the active identity's stored profile.
    pub fn profile(&self) -> watch::Receiver<ProfileState> {
        self.0.profile.subscribe()
    }

    /// Watch channel following the phase of the current submission.
    pub fn phase(&self) -> watch::Receiver<TxPhase> {
        self.0.phase.subscribe()
    }

    /// Watch channel carrying notices, newest replacing older.
    pub fn notices(&self) -> watch::Receiver<Option<Notice>> {
        self.0.notifier.watch()
    }

    /// Connects to the wallet, activates the first identity it
    /// reports and loads that identity's profile.
    ///
    /// Wallet failures become sticky notices; there is nothing the
    /// dashboard can do until the person installs a wallet or creates
    /// an account in it.
    pub async fn select_first_identity(&self) -> Result<Identity, Error> {
        let selected = self
            .0
            .session
            .select_first(self.0.bridge.as_ref(), &self.0.config.app_name)
            .await;
        match selected {
            Ok(identity) => {
                self.refresh_profile(&identity).await;
                Ok(identity)
            }
            Err(error) => {
                self.0.notifier.post_sticky(Severity::Error, error.to_string());
                Err(error)
            }
        }
    }

    /// Signs and submits the draft as the active identity's profile.
    ///
    /// The draft is validated first; nothing leaves the dashboard
    /// when a field is blank. Fields travel exactly as typed.
    pub async fn submit_set_profile(&self, draft: Draft) -> Result<(), Error> {
        if let Err(error) = draft.validate() {
            self.0.notifier.post(Severity::Error, error.to_string());
            return Err(error);
        }
        self.submit(ProfileCall::SetProfile {
            username: draft.username,
            bio: draft.bio,
        })
        .await
    }

    /// Signs and submits removal of the active identity's profile.
    pub async fn submit_remove_profile(&self) -> Result<(), Error> {
        self.submit(ProfileCall::RemoveProfile).await
    }

    async fn submit(&self, call: ProfileCall) -> Result<(), Error> {
        let Some(identity) = self.0.session.active() else {
            let error = Error::NoIdentity;
            self.0.notifier.post_sticky(Severity::Error, error.to_string());
            return Err(error);
        };

        if !self.enter_submitting() {
            let error = Error::TransactionInProgress;
            self.0.notifier.post(Severity::Error, error.to_string());
            return Err(error);
        }
        let claim = PipelineClaim::new(&self.0.phase);

        let kind = TxKind::from(&call);

        let signed = match self.sign(&identity, &call).await {
            Ok(signed) => signed,
            Err(error) => {
                claim.disarm();
                return Err(self.fail(error));
            }
        };

        let statuses = match self.0.chain.submit(signed).await {
            Ok(statuses) => statuses,
            Err(error) => {
                claim.disarm();
                return Err(self.fail(Error::Connection(error)));
            }
        };

        info!(address = %identity.address, ?kind, "Submitted profile transaction.");

        let this = self.clone();
        tokio::spawn(async move { this.drive(kind, identity, statuses).await });
        claim.disarm();
        Ok(())
    }

    async fn sign(&self, identity: &Identity, call: &ProfileCall) -> Result<SignedRequest, Error> {
        let signer = self.0.bridge.signer_for(&identity.address).await?;
        Ok(signer.sign(call).await?)
    }

    /// Follows one submission's status stream to its end.
    ///
    /// Waits for each status with a bounded patience; a silent node
    /// and a stream that ends without a terminal status both fail the
    /// submission. Reconciliation happens at finality and never at
    /// inclusion: a set is re-read from the chain, a removal drops
    /// the profile straight to absent.
    async fn drive(self, kind: TxKind, identity: Identity, mut statuses: StatusStream) {
        let wait = self.0.config.submit_timeout();
        loop {
            let status = match tokio::time::timeout(wait, statuses.next()).await {
                Ok(Some(status)) => status,
                Ok(None) => {
                    self.fail(Error::Connection(NodeError::Disconnected));
                    return;
                }
                Err(_) => {
                    self.fail(Error::Timeout(wait));
                    return;
                }
            };

            match self.advance(&status) {
                Some(TxPhase::Included) => {
                    self.0.notifier.post(Severity::Info, kind.included_text());
                }
                Some(TxPhase::Finalized) => {
                    self.0.notifier.post(Severity::Success, kind.finalized_text());
                    match kind {
                        TxKind::SetProfile => self.refresh_profile(&identity).await,
                        TxKind::RemoveProfile => {
                            self.apply_profile(&identity, ProfileState::Absent)
                        }
                    }
                    return;
                }
                Some(TxPhase::Failed) => {
                    let reason = match status {
                        TxStatus::Rejected { reason } => reason,
                        _ => "unknown".to_string(),
                    };
                    self.conclude_failure(Error::SubmissionRejected { reason });
                    return;
                }
                _ => debug!(?status, "Status did not move the lifecycle."),
            }
        }
    }

    // Claims the pipeline for a new submission. Refused while another
    // submission is in flight.
    fn enter_submitting(&self) -> bool {
        self.0.phase.send_if_modified(|phase| {
            if phase.is_in_flight() {
                return false;
            }
            *phase = TxPhase::Submitting;
            true
        })
    }

    // Applies one status event and reports the phase only when it
    // actually moved.
    fn advance(&self, status: &TxStatus) -> Option<TxPhase> {
        let mut next = None;
        self.0.phase.send_if_modified(|phase| {
            let applied = phase.apply(status);
            if applied == *phase {
                return false;
            }
            *phase = applied;
            next = Some(applied);
            true
        });
        next
    }

    // Fails the submission before any status moved it.
    fn fail(&self, error: Error) -> Error {
        self.0.phase.send_replace(TxPhase::Failed);
        self.conclude_failure(error)
    }

    // Reports a failed submission and frees the pipeline. The reset
    // only touches the Failed published by the caller; a submission
    // that claimed the freed pipeline in the meantime keeps its claim.
    fn conclude_failure(&self, error: Error) -> Error {
        warn!(%error, "Profile transaction failed.");
        self.0.notifier.post(Severity::Error, error.to_string());
        self.0.phase.send_if_modified(|phase| {
            if *phase != TxPhase::Failed {
                return false;
            }
            *phase = TxPhase::Idle;
            true
        });
        error
    }

    /// Reads `identity`'s profile from the chain and publishes the
    /// outcome.
    async fn refresh_profile(&self, identity: &Identity) {
        let key = profile::storage_key(&identity.address);
        let raw = match self.0.chain.read(&key).await {
            Ok(raw) => raw,
            Err(error) => {
                let error = Error::Connection(error);
                warn!(%error, "Profile read failed.");
                self.0.notifier.post(Severity::Error, error.to_string());
                return;
            }
        };

        let state = match profile::decode_record(raw.as_deref()) {
            Ok(ProfileRecord::Found(profile)) => ProfileState::Stored(profile),
            Ok(ProfileRecord::Absent) => ProfileState::Absent,
            Err(error) => {
                let error = Error::Decode(error);
                warn!(address = %identity.address, %error, "Stored profile is not readable.");
                self.0.notifier.post(Severity::Error, error.to_string());
                ProfileState::Absent
            }
        };

        self.apply_profile(identity, state);
    }

    // Publishes a read outcome, unless the active identity changed
    // while the read was in flight. Stale reads are dropped whole; a
    // profile never shows up under another identity.
    fn apply_profile(&self, identity: &Identity, state: ProfileState) {
        let stale = self
            .0
            .session
            .active()
            .map_or(true, |active| active.address != identity.address);
        if stale {
            debug!(address = %identity.address, "Discarding stale profile read.");
            return;
        }
        self.0.profile.send_replace(state);
    }
}

/// Hands a claimed pipeline back when the claiming command is dropped
/// at an await point before the driver task exists. Disarmed on every
/// deliberate exit from [`Chainfolio::submit`].
struct PipelineClaim<'a> {
    phase: &'a watch::Sender<TxPhase>,
    armed: bool,
}

impl<'a> PipelineClaim<'a> {
    fn new(phase: &'a watch::Sender<TxPhase>) -> PipelineClaim<'a> {
        PipelineClaim { phase, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PipelineClaim<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Submission dropped before dispatch, releasing the pipeline.");
        self.phase.send_if_modified(|phase| {
            if *phase != TxPhase::Submitting {
                return false;
            }
            *phase = TxPhase::Idle;
            true
        });
    }
}
