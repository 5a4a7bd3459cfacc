use std::{future::Future, sync::Arc};

use tokio::{sync::RwLock, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::log;

use crate::rest_client::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    /// Inline error panel text.
    Failed(String),
}

struct Slot<T> {
    generation: u64,
    view: ViewState<T>,
}

/// Page state that is fetched on mount. Every mount gets a fresh cancellation
/// token and generation; a response from an older mount is never applied.
pub struct PageLoader<T> {
    slot: Arc<RwLock<Slot<T>>>,
    token: Option<CancellationToken>,
}

impl<T: Clone + Send + Sync + 'static> PageLoader<T> {
    pub fn new() -> PageLoader<T> {
        PageLoader {
            slot: Arc::new(RwLock::new(Slot { generation: 0, view: ViewState::Loading })),
            token: None,
        }
    }

    pub async fn mount<F>(&mut self, fetch: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        self.token = Some(token.clone());

        let generation = {
            let mut slot = self.slot.write().await;
            slot.generation += 1;
            slot.view = ViewState::Loading;
            slot.generation
        };

        let slot = self.slot.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("[PAGE] Fetch {generation} cancelled");
                    return;
                },
                result = fetch => result,
            };

            let mut slot = slot.write().await;
            if slot.generation != generation || token.is_cancelled() {
                log::debug!("[PAGE] Dropped stale response {generation}, current {}", slot.generation);
                return;
            }
            slot.view = match result {
                Ok(data) => ViewState::Ready(data),
                Err(e) => {
                    log::warn!("[PAGE] Fetch failed {e}");
                    ViewState::Failed(format!("Failed to load data: {e}"))
                },
            };
        })
    }

    pub fn unmount(&mut self) {
        self.cancel();
    }

    pub async fn view(&self) -> ViewState<T> {
        self.slot.read().await.view.clone()
    }

    fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for PageLoader<T> {
    fn default() -> Self {
        PageLoader::new()
    }
}

impl<T> Drop for PageLoader<T> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}
