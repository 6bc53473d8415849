use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::catalog::CatalogClient;
use crate::controller::{SearchResponse, SearchTicket};

/// Runs catalog searches off the UI thread. Responses come back over a
/// channel that the draw loop drains once per tick, so the terminal never
/// blocks on the network.
pub(crate) struct SearchWorker {
    runtime: Runtime,
    client: Arc<CatalogClient>,
    tx: Sender<SearchResponse>,
    rx: Receiver<SearchResponse>,
}

impl SearchWorker {
    pub(crate) fn new(client: CatalogClient) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("catalog-search")
            .enable_all()
            .build()
            .context("failed to start search runtime")?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime,
            client: Arc::new(client),
            tx,
            rx,
        })
    }

    /// Start a search in the background.
    pub(crate) fn dispatch(&self, ticket: SearchTicket) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let results = client.search(&ticket.query, ticket.search_type).await;
            debug!(seq = ticket.seq, count = results.len(), "search response ready");
            // The receiver only goes away when the app is shutting down.
            let _ = tx.send(SearchResponse {
                seq: ticket.seq,
                query: ticket.query,
                results,
            });
        });
    }

    /// Everything that finished since the last call.
    pub(crate) fn drain(&self) -> Vec<SearchResponse> {
        self.rx.try_iter().collect()
    }
}
