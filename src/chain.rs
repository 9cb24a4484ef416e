//! Chain access with a lazily dialed, memoized connection.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::node::{LedgerNode, NodeConnector, NodeError, SignedRequest, StatusStream};

/// One ledger connection for the whole session.
///
/// The connector is not dialed until something needs the chain. A
/// successful dial is kept for every later call; a failed one is not
/// cached, so the next call dials again.
pub struct Chain {
    connector: Arc<dyn NodeConnector>,
    handle: OnceCell<Arc<dyn LedgerNode>>,
}

impl Chain {
    pub fn new(connector: Arc<dyn NodeConnector>) -> Chain {
        Chain {
            connector,
            handle: OnceCell::new(),
        }
    }

    /// The connected node, dialing first if needed.
    pub async fn handle(&self) -> Result<Arc<dyn LedgerNode>, NodeError> {
        self.handle
            .get_or_try_init(|| async {
                debug!("Dialing ledger node.");
                self.connector.connect().await
            })
            .await
            .map(Arc::clone)
    }

    /// Reads the raw record under `key`.
    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, NodeError> {
        self.handle().await?.read(key).await
    }

    /// Submits a signed call, returning its status stream.
    pub async fn submit(&self, request: SignedRequest) -> Result<StatusStream, NodeError> {
        self.handle().await?.submit(request).await
    }
}
