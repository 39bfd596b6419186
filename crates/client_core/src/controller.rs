//! List-edit controller: owns the record collection and the single open draft,
//! mediates every call to the store, and publishes an immutable snapshot after
//! each state transition.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{FieldKey, RecordField, RecordId, SensorRecord},
    error::summarize,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    draft::EditDraft,
    error::{ControllerError, ErrorKind, OpResult},
    store::RecordStore,
    views::{order_by_identifier, project, Page, SortSpec, ViewQuery},
};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Read-only state handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    /// Incremented on every published transition.
    pub version: u64,
    /// Collection ordered by identifier.
    pub records: Arc<[SensorRecord]>,
    pub draft: Option<EditDraft>,
    pub view: ViewQuery,
    pub loading: bool,
    pub last_error: Option<ControllerError>,
}

impl ControllerSnapshot {
    /// The filtered, sorted and paginated rows for the current view parameters.
    pub fn page(&self) -> Page<'_> {
        project(&self.records, &self.view)
    }

    pub fn editing_id(&self) -> Option<&RecordId> {
        self.draft.as_ref().map(EditDraft::id)
    }

    pub fn record(&self, id: &RecordId) -> Option<&SensorRecord> {
        self.records.iter().find(|record| &record.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// No draft was open; nothing was sent.
    NoDraft,
    /// The store accepted the update. Carries the row as the store returned it.
    Committed(SensorRecord),
}

struct ControllerState {
    records: Arc<[SensorRecord]>,
    draft: Option<EditDraft>,
    view: ViewQuery,
    pending_loads: usize,
    applied_load_seq: u64,
    last_error: Option<ControllerError>,
    version: u64,
}

impl ControllerState {
    fn new(view: ViewQuery) -> Self {
        Self {
            records: Arc::from(Vec::new()),
            draft: None,
            view,
            pending_loads: 0,
            applied_load_seq: 0,
            last_error: None,
            version: 0,
        }
    }

    fn set_error(&mut self, error: &ControllerError) {
        self.last_error = Some(error.clone());
    }

    fn clear_error(&mut self, kind: ErrorKind) {
        if self.last_error.as_ref().map(ControllerError::kind) == Some(kind) {
            self.last_error = None;
        }
    }
}

pub struct ListEditController {
    store: Arc<dyn RecordStore>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<Arc<ControllerSnapshot>>,
    load_seq: AtomicU64,
}

impl ListEditController {
    pub fn new(store: Arc<dyn RecordStore>) -> Arc<Self> {
        Self::with_view(store, ViewQuery::default())
    }

    pub fn with_view(store: Arc<dyn RecordStore>, view: ViewQuery) -> Arc<Self> {
        let (events, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            inner: Mutex::new(ControllerState::new(view)),
            events,
            load_seq: AtomicU64::new(0),
        })
    }

    /// Receives a snapshot after every state transition.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ControllerSnapshot>> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Arc<ControllerSnapshot> {
        let guard = self.inner.lock().await;
        Arc::new(Self::capture(&guard))
    }

    fn capture(state: &ControllerState) -> ControllerSnapshot {
        ControllerSnapshot {
            version: state.version,
            records: state.records.clone(),
            draft: state.draft.clone(),
            view: state.view.clone(),
            loading: state.pending_loads > 0,
            last_error: state.last_error.clone(),
        }
    }

    fn publish(&self, state: &mut ControllerState) {
        state.version += 1;
        // No subscribers is fine; the snapshot is still reachable via `snapshot()`.
        let _ = self.events.send(Arc::new(Self::capture(state)));
    }

    /// Replaces the collection with the store's current rows.
    ///
    /// Responses are sequenced: a response older than the last applied one is
    /// dropped so a slow request cannot overwrite a newer collection.
    pub async fn load(&self) -> OpResult<usize> {
        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut guard = self.inner.lock().await;
            guard.pending_loads += 1;
            self.publish(&mut guard);
        }

        let outcome = self.store.list().await;

        let mut guard = self.inner.lock().await;
        guard.pending_loads = guard.pending_loads.saturating_sub(1);
        let stale = seq <= guard.applied_load_seq;

        let result = match outcome {
            Err(err) => Err(ControllerError::fetch_failed(format!("{err:#}"))),
            Ok(response) if !response.errors.is_empty() => {
                Err(ControllerError::fetch_failed(summarize(&response.errors)))
            }
            Ok(_) if stale => {
                debug!(seq, applied = guard.applied_load_seq, "dropping stale list response");
                Ok(guard.records.len())
            }
            Ok(response) => {
                let records = order_by_identifier(response.data);
                let count = records.len();
                guard.records = records.into();
                guard.applied_load_seq = seq;
                guard.clear_error(ErrorKind::FetchFailed);
                info!(seq, count, "collection loaded");
                Ok(count)
            }
        };

        if let Err(err) = &result {
            warn!(seq, error = %err, "load failed; keeping previous collection");
            if !stale {
                guard.set_error(err);
            }
        }
        self.publish(&mut guard);
        result
    }

    /// Opens a draft for `id`, replacing any draft already open.
    /// Returns `false` and leaves state untouched when the id is not in the collection.
    pub async fn begin_edit(&self, id: &RecordId) -> OpResult<bool> {
        let mut guard = self.inner.lock().await;
        let Some(record) = guard.records.iter().find(|record| &record.id == id) else {
            debug!(%id, "begin_edit for unknown record ignored");
            return Ok(false);
        };
        let draft = EditDraft::seed(record);
        if let Some(previous) = guard.draft.replace(draft) {
            debug!(previous = %previous.id(), %id, "replacing open draft");
        }
        self.publish(&mut guard);
        Ok(true)
    }

    /// Merges one field into the open draft. Returns `false` when no draft is open.
    pub async fn update_draft_field(&self, field: RecordField, value: &str) -> OpResult<bool> {
        let mut guard = self.inner.lock().await;
        let Some(draft) = guard.draft.as_mut() else {
            return Ok(false);
        };
        let result = draft.set_field(field, value);
        self.publish(&mut guard);
        result.map(|()| true).map_err(ControllerError::from)
    }

    /// Sends the open draft to the store.
    ///
    /// On success the row is merged in place, the draft closes and the
    /// collection is reloaded from the store. On failure the draft stays open
    /// and the collection is left as it was.
    pub async fn commit_edit(&self) -> OpResult<CommitOutcome> {
        let (input, changed) = {
            let guard = self.inner.lock().await;
            let Some(draft) = guard.draft.as_ref() else {
                return Ok(CommitOutcome::NoDraft);
            };
            let input = draft.to_input().map_err(ControllerError::from)?;
            (input, draft.changed_fields())
        };
        let id = input.id.clone();
        info!(%id, changed = ?changed, "committing draft");

        let outcome = self.store.update(input.clone()).await;

        let committed = {
            let mut guard = self.inner.lock().await;
            let response = match outcome {
                Err(err) => Err(ControllerError::update_failed(format!("{err:#}"))),
                Ok(response) if !response.errors.is_empty() => {
                    Err(ControllerError::update_failed(summarize(&response.errors)))
                }
                Ok(response) => Ok(response),
            };
            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    warn!(%id, error = %err, "update failed; draft kept open");
                    guard.set_error(&err);
                    self.publish(&mut guard);
                    return Err(err);
                }
            };

            let mut records = guard.records.to_vec();
            let committed = match records.iter_mut().find(|record| record.id == id) {
                Some(row) => {
                    match response.data {
                        Some(confirmed) if confirmed.id == id => *row = confirmed,
                        _ => input.apply_to(row),
                    }
                    row.clone()
                }
                None => response.data.unwrap_or_else(|| {
                    let mut row = SensorRecord::new(id.clone());
                    input.apply_to(&mut row);
                    row
                }),
            };
            guard.records = records.into();
            if guard.draft.as_ref().map(EditDraft::id) == Some(&id) {
                guard.draft = None;
            }
            guard.clear_error(ErrorKind::UpdateFailed);
            self.publish(&mut guard);
            committed
        };

        // The merge above is provisional; the store's post-update state wins.
        if let Err(err) = self.load().await {
            warn!(%id, error = %err, "reload after commit failed");
        }
        Ok(CommitOutcome::Committed(committed))
    }

    /// Discards the open draft, if any. Never calls the store.
    pub async fn cancel_edit(&self) -> OpResult<bool> {
        let mut guard = self.inner.lock().await;
        let Some(draft) = guard.draft.take() else {
            return Ok(false);
        };
        debug!(id = %draft.id(), "draft discarded");
        self.publish(&mut guard);
        Ok(true)
    }

    /// Sets the search text and returns to the first page.
    pub async fn set_search(&self, search: impl Into<String>) -> OpResult<()> {
        let mut guard = self.inner.lock().await;
        guard.view.search = search.into();
        guard.view.page = 1;
        self.publish(&mut guard);
        Ok(())
    }

    /// Sorts by `key`; asking for the current key again flips the direction.
    pub async fn sort_by(&self, key: FieldKey) -> OpResult<SortSpec> {
        let mut guard = self.inner.lock().await;
        let spec = SortSpec::toggle(guard.view.sort.as_ref(), key);
        guard.view.sort = Some(spec.clone());
        self.publish(&mut guard);
        Ok(spec)
    }

    pub async fn set_page(&self, page: usize) -> OpResult<()> {
        let mut guard = self.inner.lock().await;
        guard.view.page = page;
        self.publish(&mut guard);
        Ok(())
    }

    pub async fn set_page_size(&self, page_size: usize) -> OpResult<()> {
        let mut guard = self.inner.lock().await;
        guard.view.page_size = page_size.max(1);
        self.publish(&mut guard);
        Ok(())
    }

    pub async fn dismiss_error(&self) -> OpResult<bool> {
        let mut guard = self.inner.lock().await;
        if guard.last_error.take().is_none() {
            return Ok(false);
        }
        self.publish(&mut guard);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
