//! Async driver for [`ChartState`].
//!
//! Each fetch the reducer asks for runs as its own task; the result is fed
//! back through the reducer, which discards it if a newer request exists.
//! Selections never wait on in-flight fetches.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{Action, ChartState, Effect, FetchRequest, Viewport};
use crate::domain::{DailyVisitors, TimeRange};

type FetchFuture = Pin<Box<dyn Future<Output = Vec<DailyVisitors>> + Send>>;
type Fetcher = Arc<dyn Fn(TimeRange) -> FetchFuture + Send + Sync>;

#[derive(Clone)]
pub struct ChartController {
    state: Arc<Mutex<ChartState>>,
    fetcher: Fetcher,
    timeout: Option<Duration>,
    range_tx: Arc<watch::Sender<TimeRange>>,
}

impl ChartController {
    pub fn new<F, Fut>(initial: ChartState, fetcher: F) -> Self
    where
        F: Fn(TimeRange) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<DailyVisitors>> + Send + 'static,
    {
        let (range_tx, _) = watch::channel(initial.selected());
        Self {
            state: Arc::new(Mutex::new(initial)),
            fetcher: Arc::new(move |range| Box::pin(fetcher(range)) as FetchFuture),
            timeout: None,
            range_tx: Arc::new(range_tx),
        }
    }

    /// Abandon requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The shareable selection; updated on every change, forced or not
    pub fn subscribe_range(&self) -> watch::Receiver<TimeRange> {
        self.range_tx.subscribe()
    }

    pub async fn snapshot(&self) -> ChartState {
        self.state.lock().await.clone()
    }

    pub async fn select(&self, range: TimeRange) -> Option<JoinHandle<()>> {
        self.dispatch(Action::Select(range)).await
    }

    pub async fn viewport_changed(&self, viewport: Viewport) -> Option<JoinHandle<()>> {
        self.dispatch(Action::ViewportChanged(viewport)).await
    }

    /// Apply `action` and start whatever fetch it requests. The returned
    /// handle completes once that fetch has been fed back.
    pub async fn dispatch(&self, action: Action) -> Option<JoinHandle<()>> {
        let (effects, selected) = {
            let mut state = self.state.lock().await;
            let effects = state.apply(action);
            (effects, state.selected())
        };

        self.range_tx.send_if_modified(|current| {
            if *current == selected {
                return false;
            }
            *current = selected;
            true
        });

        let mut handle = None;
        for effect in effects {
            match effect {
                Effect::ReplaceRange(range) => {
                    info!(range = range.as_str(), "Selection forced by viewport");
                }
                Effect::Fetch(request) => handle = Some(self.spawn_fetch(request)),
            }
        }
        handle
    }

    fn spawn_fetch(&self, request: FetchRequest) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let fetch = (self.fetcher)(request.range);
        let timeout = self.timeout;

        tokio::spawn(async move {
            debug!(ticket = request.ticket, range = request.range.as_str(), "Fetching series");

            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, fetch).await.ok(),
                None => Some(fetch.await),
            };

            let action = match outcome {
                Some(series) => Action::Loaded {
                    ticket: request.ticket,
                    series,
                },
                None => {
                    warn!(
                        ticket = request.ticket,
                        range = request.range.as_str(),
                        "Series fetch timed out"
                    );
                    Action::Abandon(request.ticket)
                }
            };

            state.lock().await.apply(action);
        })
    }
}
