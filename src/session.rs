//! Wallet session: discovered identities and the active one.

use tokio::sync::watch;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vec1::Vec1;

use crate::bridge::{Identity, WalletBridge};
use crate::error::Error;

/// Identities known to this session.
///
/// Discovery runs only when [`Session::select_first`] is called, so a
/// wallet changing underneath does not move the session on its own.
pub struct Session {
    discovered: Mutex<Option<Vec1<Identity>>>,
    active: watch::Sender<Option<Identity>>,
}

impl Session {
    pub fn new() -> Session {
        let (active, _) = watch::channel(None);
        Session {
            discovered: Mutex::new(None),
            active,
        }
    }

    /// Runs discovery against the wallet and activates the first
    /// identity it reports, mirroring the wallet's own ordering.
    ///
    /// An unreachable wallet and a wallet with no identities are
    /// different failures; the caller tells people which one it was.
    pub async fn select_first(
        &self,
        bridge: &dyn WalletBridge,
        app_name: &str,
    ) -> Result<Identity, Error> {
        bridge.enable(app_name).await.map_err(|_| Error::NoWallet)?;
        let identities = bridge.identities().await.map_err(|_| Error::NoWallet)?;
        debug!("Wallet reported {} identities.", identities.len());

        let identities = Vec1::try_from_vec(identities).map_err(|_| Error::NoIdentity)?;
        let first = identities.first().clone();
        info!(address = %first.address, "Activating wallet identity.");

        *self.discovered.lock().await = Some(identities);
        self.active.send_replace(Some(first.clone()));
        Ok(first)
    }

    /// The active identity, if discovery has run.
    pub fn active(&self) -> Option<Identity> {
        self.active.borrow().clone()
    }

    /// Watch channel following the active identity.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.active.subscribe()
    }

    /// All identities found by the last discovery.
    pub async fn discovered(&self) -> Option<Vec1<Identity>> {
        self.discovered.lock().await.clone()
    }
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devnet::DevWallet;

    #[tokio::test]
    async fn selects_the_first_discovered_identity() {
        let wallet = DevWallet::new()
            .with_identity("addr-one", Some("One"))
            .with_identity("addr-two", None);
        let session = Session::new();

        let identity = session.select_first(&wallet, "tests").await.unwrap();

        assert_eq!(identity.address, "addr-one");
        assert_eq!(identity.display_name.as_deref(), Some("One"));
        assert_eq!(session.active().unwrap().address, "addr-one");
        assert_eq!(session.discovered().await.unwrap().len(), 2);
        assert_eq!(wallet.enabled_by(), vec!["tests".to_string()]);
    }

    #[tokio::test]
    async fn missing_wallet_and_empty_wallet_are_distinct() {
        let session = Session::new();

        let err = session
            .select_first(&DevWallet::unavailable(), "tests")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoWallet));

        let err = session
            .select_first(&DevWallet::new(), "tests")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoIdentity));

        assert!(session.active().is_none());
        assert!(session.discovered().await.is_none());
    }

    #[tokio::test]
    async fn reselection_follows_the_wallet() {
        let wallet = DevWallet::new().with_identity("addr-one", None);
        let session = Session::new();
        session.select_first(&wallet, "tests").await.unwrap();

        wallet.set_identities(vec![Identity {
            address: "addr-two".to_string(),
            display_name: None,
        }]);
        let identity = session.select_first(&wallet, "tests").await.unwrap();

        assert_eq!(identity.address, "addr-two");
        assert_eq!(session.active().unwrap().address, "addr-two");
    }
}
