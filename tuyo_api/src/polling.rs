//! Snapshot view refreshed on a fixed period.
//!
//! [`PollingView::mount`] fetches immediately and then once per period until
//! the view is unmounted or dropped. Each fetch is tagged with a sequence
//! number; a response is applied only if it is newer than the snapshot on
//! display, so a slow response cannot overwrite a fresher one. Failed
//! fetches keep the previous snapshot on screen. [`PollingView::changes`]
//! fires after every fetch result that was not discarded.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{error::TuyoError, types::realtime::StationArrivals};

/// Where a view's snapshot comes from.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    type Item: Searchable + Clone + Send + Sync + 'static;

    async fn fetch(&self) -> Result<Vec<Self::Item>, TuyoError>;
}

/// The text the view's search box matches against.
pub trait Searchable {
    fn search_key(&self) -> &str;
}

impl Searchable for StationArrivals {
    fn search_key(&self) -> &str {
        &self.name
    }
}

/// What to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Render<T> {
    /// No fetch has succeeded yet.
    Loading,
    Ready(Vec<T>),
}

#[derive(Debug)]
struct ViewState<T> {
    snapshot: Option<Vec<T>>,
    filter: String,
    issued: u64,
    applied: u64,
    consecutive_failures: u32,
}

pub struct PollingView<T> {
    state: Arc<Mutex<ViewState<T>>>,
    updates: Arc<watch::Sender<u64>>,
    cancel: CancellationToken,
    ticker: JoinHandle<()>,
}

impl<T> PollingView<T>
where
    T: Searchable + Clone + Send + Sync + 'static,
{
    /// Start polling `source` every `period`. Must be called inside a tokio
    /// runtime.
    pub fn mount<S>(source: S, period: Duration) -> Self
    where
        S: SnapshotSource<Item = T>,
    {
        let state = Arc::new(Mutex::new(ViewState {
            snapshot: None,
            filter: String::new(),
            issued: 0,
            applied: 0,
            consecutive_failures: 0,
        }));
        let (updates, _) = watch::channel(0u64);
        let updates = Arc::new(updates);
        let cancel = CancellationToken::new();
        let source = Arc::new(source);

        let ticker = tokio::spawn({
            let state = state.clone();
            let updates = updates.clone();
            let cancel = cancel.clone();
            async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            let seq = {
                                let mut st = state.lock().await;
                                st.issued += 1;
                                st.issued
                            };
                            tokio::spawn(fetch_once(
                                source.clone(),
                                state.clone(),
                                updates.clone(),
                                cancel.clone(),
                                seq,
                            ));
                        }
                    }
                }
                tracing::debug!("polling stopped");
            }
        });

        Self {
            state,
            updates,
            cancel,
            ticker,
        }
    }

    /// The filtered snapshot, or [`Render::Loading`] before the first success.
    pub async fn render(&self) -> Render<T> {
        let st = self.state.lock().await;
        match &st.snapshot {
            None => Render::Loading,
            Some(items) => Render::Ready(apply_filter(items, &st.filter)),
        }
    }

    /// Case-insensitive substring filter over the item names.
    pub async fn set_filter(&self, query: &str) {
        self.state.lock().await.filter = query.to_string();
    }

    /// Failed fetches since the last success.
    pub async fn consecutive_failures(&self) -> u32 {
        self.state.lock().await.consecutive_failures
    }

    /// Marked changed after every success or failure the view records.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Stop the timer. Fetches already in flight complete but are discarded.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled() && !self.ticker.is_finished()
    }
}

impl<T> Drop for PollingView<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn fetch_once<S: SnapshotSource>(
    source: Arc<S>,
    state: Arc<Mutex<ViewState<S::Item>>>,
    updates: Arc<watch::Sender<u64>>,
    cancel: CancellationToken,
    seq: u64,
) {
    let result = source.fetch().await;

    let mut st = state.lock().await;
    if cancel.is_cancelled() {
        tracing::debug!(seq, "view unmounted; dropping response");
        return;
    }
    if seq <= st.applied {
        tracing::debug!(seq, applied = st.applied, "dropping out-of-order response");
        return;
    }

    match result {
        Ok(items) => {
            st.applied = seq;
            st.snapshot = Some(items);
            st.consecutive_failures = 0;
        }
        Err(e) => {
            st.consecutive_failures += 1;
            tracing::warn!(
                seq,
                failures = st.consecutive_failures,
                error = %e,
                "snapshot refresh failed; keeping previous data"
            );
        }
    }
    drop(st);
    updates.send_modify(|n| *n += 1);
}

/// Plain case-insensitive substring match; whitespace in the query counts.
pub fn apply_filter<T: Searchable + Clone>(items: &[T], query: &str) -> Vec<T> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.search_key().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
