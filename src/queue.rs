use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::api::PersistenceApi;
use crate::events::ChangeBus;
use crate::journal::Journal;
use crate::model::{
    is_temp_id, temp_id, ChangeAction, ChangeEvent, ChangePayload, Document, DocumentDraft,
    Entity, EntityKind, Folder, FolderDraft, MoveDescriptor, OpAction, PendingOp,
};
use crate::net::NetworkMonitor;
use crate::snapshot::SnapshotStore;

/// Queue tuning knobs; `Config::tuning()` builds one from the YAML config.
#[derive(Debug, Clone)]
pub struct QueueTuning {
    /// Pending operations beyond this evict the oldest queued one.
    pub max_pending: usize,
    /// Total attempts per retryable operation (first try included).
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for QueueTuning {
    fn default() -> Self {
        Self {
            max_pending: 256,
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
            backoff_cap: Duration::from_secs(5),
        }
    }
}

/// Host-facing snapshot of queue health, published over a watch channel
/// whenever any field changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub is_online: bool,
    pub pending_operations: usize,
    pub last_error: Option<String>,
    pub is_processing: bool,
}

/// Optimistic mutation queue: applies create/update/delete/move effects to
/// local state synchronously (via the change bus) and dispatches the
/// authoritative writes serially in the background, rolling back on failure.
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct MutationQueue {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn PersistenceApi>,
    store: Arc<dyn SnapshotStore>,
    monitor: Arc<dyn NetworkMonitor>,
    bus: ChangeBus,
    status: watch::Sender<QueueStatus>,
    wake: Notify,
    tuning: QueueTuning,
    /// Identity of the signed-in user, stamped onto optimistic entities.
    owner_id: String,
    journal: Option<Journal>,
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    ops: VecDeque<PendingOp>,
    /// Pre-mutation snapshots for update/delete; creates have nothing to
    /// roll back to.
    rollbacks: HashMap<Uuid, Entity>,
    /// Recorded inverse moves per drag-and-drop batch.
    batches: HashMap<Uuid, Vec<MoveDescriptor>>,
    last_error: Option<String>,
    in_flight: usize,
    is_processing: bool,
    is_online: bool,
}

impl MutationQueue {
    pub fn new(
        api: Arc<dyn PersistenceApi>,
        store: Arc<dyn SnapshotStore>,
        monitor: Arc<dyn NetworkMonitor>,
        owner_id: impl Into<String>,
        tuning: QueueTuning,
    ) -> Self {
        Self::build(api, store, monitor, owner_id.into(), tuning, None)
    }

    pub fn with_journal(
        api: Arc<dyn PersistenceApi>,
        store: Arc<dyn SnapshotStore>,
        monitor: Arc<dyn NetworkMonitor>,
        owner_id: impl Into<String>,
        tuning: QueueTuning,
        journal: Journal,
    ) -> Self {
        Self::build(api, store, monitor, owner_id.into(), tuning, Some(journal))
    }

    fn build(
        api: Arc<dyn PersistenceApi>,
        store: Arc<dyn SnapshotStore>,
        monitor: Arc<dyn NetworkMonitor>,
        owner_id: String,
        tuning: QueueTuning,
        journal: Option<Journal>,
    ) -> Self {
        let is_online = monitor.is_online();
        let (status, _) = watch::channel(QueueStatus {
            is_online,
            pending_operations: 0,
            last_error: None,
            is_processing: false,
        });
        let inner = Arc::new(Inner {
            api,
            store,
            monitor,
            bus: ChangeBus::default(),
            status,
            wake: Notify::new(),
            tuning,
            owner_id,
            journal,
            state: Mutex::new(QueueState {
                is_online,
                ..Default::default()
            }),
        });
        Self { inner }
    }

    /// Spawn the background network watcher and drain loop. Call once from
    /// the composition root after construction (and after `recover`).
    pub fn start(&self) {
        tokio::spawn(network_loop(self.inner.clone()));
        tokio::spawn(drain_loop(self.inner.clone()));
    }

    /// Reload journaled operations from a previous run into the queue.
    /// No change events are emitted: the UI rebuilds from the server, the
    /// queued writes just still need to happen.
    pub async fn recover(&self) -> Result<usize> {
        let Some(journal) = &self.inner.journal else {
            return Ok(0);
        };
        let ops = journal.load_pending().await?;
        let recovered = ops.len();
        if recovered > 0 {
            {
                let mut state = self.inner.state.lock().expect("queue lock");
                state.ops.extend(ops);
            }
            info!(recovered, "recovered journaled operations");
            self.inner.publish_status();
            self.inner.wake.notify_one();
        }
        Ok(recovered)
    }

    pub fn status(&self) -> QueueStatus {
        self.inner.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<QueueStatus> {
        self.inner.status.subscribe()
    }

    pub fn subscribe_changes(&self) -> tokio::sync::broadcast::Receiver<ChangeEvent> {
        self.inner.bus.subscribe()
    }

    /// Snapshot of the queued (not yet in-flight) operations, oldest first.
    pub fn pending_ops(&self) -> Vec<PendingOp> {
        let state = self.inner.state.lock().expect("queue lock");
        state.ops.iter().cloned().collect()
    }

    /// Optimistically create a document. The returned entity carries a
    /// temporary id until the create is confirmed and a replace event swaps
    /// in the server identity.
    pub async fn create_document(&self, draft: DocumentDraft) -> Result<Document> {
        let doc = draft.into_document(temp_id(), self.inner.owner_id.clone());
        let payload = json!({
            "title": doc.title,
            "content": doc.content,
            "folder_id": doc.folder_id,
            "order": doc.order,
        });
        self.inner.bus.send(ChangeEvent {
            kind: EntityKind::Document,
            action: ChangeAction::Create,
            payload: ChangePayload::Entity(Entity::Document(doc.clone())),
        });
        let op = PendingOp::new(
            EntityKind::Document,
            OpAction::Create,
            doc.id.clone(),
            payload,
        );
        self.inner.enqueue(op).await?;
        Ok(doc)
    }

    pub async fn create_folder(&self, draft: FolderDraft) -> Result<Folder> {
        let folder = draft.into_folder(temp_id(), self.inner.owner_id.clone());
        let payload = json!({
            "name": folder.name,
            "parent_id": folder.parent_id,
            "order": folder.order,
        });
        self.inner.bus.send(ChangeEvent {
            kind: EntityKind::Folder,
            action: ChangeAction::Create,
            payload: ChangePayload::Entity(Entity::Folder(folder.clone())),
        });
        let op = PendingOp::new(
            EntityKind::Folder,
            OpAction::Create,
            folder.id.clone(),
            payload,
        );
        self.inner.enqueue(op).await?;
        Ok(folder)
    }

    /// Optimistically merge `fields` into a document; the PUT is queued and
    /// the pre-update snapshot retained for rollback.
    pub async fn update_document(&self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let snapshot = self.inner.store.document(id).map(Entity::Document);
        self.mutate(EntityKind::Document, OpAction::Update, id, fields, snapshot)
            .await
    }

    pub async fn update_folder(&self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let snapshot = self.inner.store.folder(id).map(Entity::Folder);
        self.mutate(EntityKind::Folder, OpAction::Update, id, fields, snapshot)
            .await
    }

    /// Flip a folder's expanded/collapsed flag; goes to the dedicated
    /// expansion endpoint but otherwise behaves like an update.
    pub async fn update_folder_expansion(&self, id: &str, is_expanded: bool) -> Result<()> {
        let snapshot = self.inner.store.folder(id).map(Entity::Folder);
        let mut fields = Map::new();
        fields.insert("is_expanded".into(), json!(is_expanded));
        self.mutate(EntityKind::Folder, OpAction::Expand, id, fields, snapshot)
            .await
    }

    /// Soft-delete a document. Deletion is never physical from the client's
    /// perspective; a failed delete restores the snapshot to visibility.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let snapshot = self.inner.store.document(id).map(Entity::Document);
        self.delete(EntityKind::Document, id, snapshot).await
    }

    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        let snapshot = self.inner.store.folder(id).map(Entity::Folder);
        self.delete(EntityKind::Folder, id, snapshot).await
    }

    async fn mutate(
        &self,
        kind: EntityKind,
        action: OpAction,
        id: &str,
        fields: Map<String, Value>,
        snapshot: Option<Entity>,
    ) -> Result<()> {
        self.inner.bus.send(ChangeEvent {
            kind,
            action: ChangeAction::Update,
            payload: ChangePayload::Fields {
                id: id.to_string(),
                fields: fields.clone(),
            },
        });
        let op = PendingOp::new(kind, action, id.to_string(), Value::Object(fields));
        self.inner.remember_rollback(op.id, snapshot);
        self.inner.enqueue(op).await
    }

    async fn delete(&self, kind: EntityKind, id: &str, snapshot: Option<Entity>) -> Result<()> {
        self.inner.bus.send(ChangeEvent {
            kind,
            action: ChangeAction::Delete,
            payload: ChangePayload::Delete { id: id.to_string() },
        });
        let op = PendingOp::new(kind, OpAction::Delete, id.to_string(), Value::Null);
        self.inner.remember_rollback(op.id, snapshot);
        self.inner.enqueue(op).await
    }

    /// Optimistically reparent/reorder a single document. Single moves have
    /// no dedicated rollback path; gestures that need undo go through
    /// `perform_dnd_batch`.
    pub async fn move_document_optimistic(&self, mut mv: MoveDescriptor) -> Result<()> {
        mv.kind = EntityKind::Document;
        self.move_optimistic(mv).await
    }

    pub async fn move_folder_optimistic(&self, mut mv: MoveDescriptor) -> Result<()> {
        mv.kind = EntityKind::Folder;
        self.move_optimistic(mv).await
    }

    async fn move_optimistic(&self, mv: MoveDescriptor) -> Result<()> {
        self.inner.bus.send(ChangeEvent {
            kind: mv.kind,
            action: ChangeAction::Move,
            payload: ChangePayload::Move(mv.clone()),
        });
        let op = PendingOp::new(
            mv.kind,
            OpAction::Update,
            mv.id.clone(),
            Value::Object(move_fields(&mv)),
        );
        self.inner.enqueue(op).await
    }

    /// Apply a whole drag-and-drop gesture: all moves take local effect
    /// immediately, the underlying updates go out concurrently, and any
    /// failure rolls the entire batch back and propagates to the caller.
    pub async fn perform_dnd_batch(
        &self,
        moves: Vec<MoveDescriptor>,
        batch_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let batch_id = batch_id.unwrap_or_else(Uuid::new_v4);
        if moves.is_empty() {
            return Ok(batch_id);
        }

        for mv in &moves {
            self.inner.bus.send(ChangeEvent {
                kind: mv.kind,
                action: ChangeAction::Move,
                payload: ChangePayload::Move(mv.clone()),
            });
        }
        {
            let mut state = self.inner.state.lock().expect("queue lock");
            state
                .batches
                .insert(batch_id, moves.iter().map(MoveDescriptor::inverted).collect());
        }

        let calls = moves
            .iter()
            .filter(|mv| !is_temp_id(&mv.id))
            .map(|mv| {
                let api = self.inner.api.clone();
                let mv = mv.clone();
                async move {
                    let fields = Value::Object(move_fields(&mv));
                    match mv.kind {
                        EntityKind::Document => {
                            api.update_document(&mv.id, &fields).await.map(|_| ())
                        }
                        EntityKind::Folder => api.update_folder(&mv.id, &fields).await.map(|_| ()),
                    }
                    .with_context(|| format!("move of {} failed", mv.id))
                }
            })
            .collect::<Vec<_>>();

        match futures::future::try_join_all(calls).await {
            Ok(_) => {
                let mut state = self.inner.state.lock().expect("queue lock");
                state.batches.remove(&batch_id);
                debug!(%batch_id, moves = moves.len(), "drag-and-drop batch confirmed");
                Ok(batch_id)
            }
            Err(err) => {
                warn!(%batch_id, %err, "drag-and-drop batch failed; rolling back");
                self.rollback_dnd_operation(batch_id);
                self.inner.record_error(err.to_string());
                Err(err.context("drag-and-drop batch failed"))
            }
        }
    }

    /// Emit the inverse of every move recorded under `batch_id`. Local only;
    /// no remote calls are made.
    pub fn rollback_dnd_operation(&self, batch_id: Uuid) {
        let reverses = {
            let mut state = self.inner.state.lock().expect("queue lock");
            state.batches.remove(&batch_id)
        };
        let Some(reverses) = reverses else {
            warn!(%batch_id, "rollback requested for unknown batch");
            return;
        };
        for mv in reverses {
            self.inner.bus.send(ChangeEvent {
                kind: mv.kind,
                action: ChangeAction::Move,
                payload: ChangePayload::Move(mv),
            });
        }
    }

    /// Wake the drain loop immediately instead of waiting for the next
    /// trigger. A no-op while offline.
    pub fn force_sync(&self) {
        self.inner.wake.notify_one();
    }

    /// Discard all queued operations and their rollback snapshots. Idempotent.
    pub async fn clear_queue(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock().expect("queue lock");
            state.ops.clear();
            state.rollbacks.clear();
        }
        if let Some(journal) = &self.inner.journal {
            journal.clear().await?;
        }
        self.inner.publish_status();
        Ok(())
    }
}

fn move_fields(mv: &MoveDescriptor) -> Map<String, Value> {
    let mut fields = Map::new();
    let parent_key = match mv.kind {
        EntityKind::Document => "folder_id",
        EntityKind::Folder => "parent_id",
    };
    fields.insert(parent_key.into(), json!(mv.to_parent));
    fields.insert("order".into(), json!(mv.to_order));
    fields
}

fn backoff_delay(tuning: &QueueTuning, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let ms = tuning
        .backoff_base
        .as_millis()
        .saturating_mul(1u128 << exp)
        .min(tuning.backoff_cap.as_millis());
    Duration::from_millis(ms as u64)
}

impl Inner {
    fn publish_status(&self) {
        let snapshot = {
            let state = self.state.lock().expect("queue lock");
            QueueStatus {
                is_online: state.is_online,
                pending_operations: state.ops.len() + state.in_flight,
                last_error: state.last_error.clone(),
                is_processing: state.is_processing,
            }
        };
        self.status.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }

    fn remember_rollback(&self, op_id: Uuid, snapshot: Option<Entity>) {
        let Some(snapshot) = snapshot else {
            debug!(%op_id, "no snapshot available; rollback disabled for this op");
            return;
        };
        let mut state = self.state.lock().expect("queue lock");
        state.rollbacks.insert(op_id, snapshot);
    }

    fn record_error(&self, message: String) {
        {
            let mut state = self.state.lock().expect("queue lock");
            state.last_error = Some(message);
        }
        self.publish_status();
    }

    /// Append an operation, evicting the oldest queued one at capacity.
    async fn enqueue(&self, op: PendingOp) -> Result<()> {
        let evicted = {
            let mut state = self.state.lock().expect("queue lock");
            let evicted = if state.ops.len() >= self.tuning.max_pending {
                state.ops.pop_front()
            } else {
                None
            };
            if let Some(old) = &evicted {
                state.rollbacks.remove(&old.id);
            }
            state.ops.push_back(op.clone());
            evicted
        };
        if let Some(old) = &evicted {
            warn!(op_id = %old.id, target_id = %old.target_id, "pending queue full; evicting oldest operation");
        }
        if let Some(journal) = &self.journal {
            journal.insert(&op).await?;
            if let Some(old) = &evicted {
                journal.remove(old.id).await?;
            }
        }
        self.publish_status();
        self.wake.notify_one();
        Ok(())
    }

    fn pop_op(&self) -> Option<PendingOp> {
        let popped = {
            let mut state = self.state.lock().expect("queue lock");
            if !state.is_online {
                return None;
            }
            let op = state.ops.pop_front();
            if op.is_some() {
                state.in_flight = 1;
            }
            op
        };
        if popped.is_some() {
            self.publish_status();
        }
        popped
    }

    fn has_work(&self) -> bool {
        let state = self.state.lock().expect("queue lock");
        state.is_online && !state.ops.is_empty()
    }

    fn set_processing(&self, processing: bool) {
        {
            let mut state = self.state.lock().expect("queue lock");
            state.is_processing = processing;
        }
        self.publish_status();
    }

    /// Settle an in-flight op: drop its rollback entry and journal row, and
    /// record the failure message if it was dropped on error.
    async fn finish_op(&self, op: &PendingOp, error: Option<String>) -> Result<()> {
        {
            let mut state = self.state.lock().expect("queue lock");
            state.in_flight = 0;
            state.rollbacks.remove(&op.id);
            if let Some(message) = error {
                state.last_error = Some(message);
            }
        }
        if let Some(journal) = &self.journal {
            journal.remove(op.id).await?;
        }
        self.publish_status();
        Ok(())
    }

    fn take_rollback(&self, op_id: Uuid) -> Option<Entity> {
        let mut state = self.state.lock().expect("queue lock");
        state.rollbacks.remove(&op_id)
    }
}

/// Mirror the injected network signal into queue state; coming back online
/// schedules a sync automatically.
async fn network_loop(inner: Arc<Inner>) {
    let mut rx = inner.monitor.watch();
    loop {
        let online = *rx.borrow_and_update();
        let changed = {
            let mut state = inner.state.lock().expect("queue lock");
            if state.is_online != online {
                state.is_online = online;
                true
            } else {
                false
            }
        };
        if changed {
            inner.publish_status();
            if online {
                info!("network is back online; scheduling sync");
                inner.wake.notify_one();
            } else {
                let pending = inner.status.borrow().pending_operations;
                info!(pending, "network went offline; holding queue");
            }
        }
        if rx.changed().await.is_err() {
            debug!("network monitor dropped; stopping watcher");
            break;
        }
    }
}

/// Strictly serial drain: one operation at a time, in enqueue order, while
/// online. The drag-and-drop batch path is the only concurrent exception and
/// bypasses this loop entirely.
async fn drain_loop(inner: Arc<Inner>) {
    loop {
        let notified = inner.wake.notified();
        if !inner.has_work() {
            notified.await;
            continue;
        }
        inner.set_processing(true);
        while let Some(op) = inner.pop_op() {
            if let Err(err) = process_op(&inner, op).await {
                error!(?err, "drain step failed");
            }
        }
        inner.set_processing(false);
    }
}

#[instrument(skip_all, fields(op_id = %op.id, kind = op.kind.as_str(), action = op.action.as_str()))]
async fn process_op(inner: &Arc<Inner>, mut op: PendingOp) -> Result<()> {
    // An update/delete whose target is still a temporary id would reference
    // an entity the server does not know yet; expected transient state.
    if op.action != OpAction::Create && is_temp_id(&op.target_id) {
        debug!(target_id = %op.target_id, "target still unconfirmed; skipping");
        return inner.finish_op(&op, None).await;
    }

    loop {
        match dispatch(inner, &op).await {
            Ok(()) => return inner.finish_op(&op, None).await,
            Err(err) => {
                if op.action.retryable() && op.attempt + 1 < inner.tuning.max_attempts {
                    op.attempt += 1;
                    let delay = backoff_delay(&inner.tuning, op.attempt);
                    warn!(%err, attempt = op.attempt, ?delay, "remote call failed; retrying");
                    if let Some(journal) = &inner.journal {
                        journal.bump_attempt(op.id, op.attempt).await?;
                    }
                    tokio::time::sleep(delay).await;
                    continue;
                }

                warn!(%err, attempt = op.attempt, "remote call failed; dropping operation");
                if let Some(snapshot) = inner.take_rollback(op.id) {
                    inner.bus.send(ChangeEvent {
                        kind: op.kind,
                        action: ChangeAction::Rollback,
                        payload: ChangePayload::Entity(snapshot),
                    });
                }
                return inner.finish_op(&op, Some(err.to_string())).await;
            }
        }
    }
}

/// Execute the remote call for one operation and emit its confirmation event.
async fn dispatch(inner: &Arc<Inner>, op: &PendingOp) -> Result<()> {
    match (op.kind, op.action) {
        (EntityKind::Document, OpAction::Create) => {
            let doc = inner.api.create_document(&op.payload).await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Document,
                action: ChangeAction::Replace,
                payload: ChangePayload::Replace {
                    temp_id: op.target_id.clone(),
                    entity: Entity::Document(doc),
                },
            });
        }
        (EntityKind::Document, OpAction::Update) => {
            let doc = inner.api.update_document(&op.target_id, &op.payload).await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Document,
                action: ChangeAction::Update,
                payload: ChangePayload::Entity(Entity::Document(doc)),
            });
        }
        (EntityKind::Document, OpAction::Delete) => {
            inner.api.delete_document(&op.target_id).await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Document,
                action: ChangeAction::Delete,
                payload: ChangePayload::Delete {
                    id: op.target_id.clone(),
                },
            });
        }
        (EntityKind::Document, OpAction::Expand) => {
            bail!("expansion applies to folders only");
        }
        (EntityKind::Folder, OpAction::Create) => {
            let folder = inner.api.create_folder(&op.payload).await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Folder,
                action: ChangeAction::Replace,
                payload: ChangePayload::Replace {
                    temp_id: op.target_id.clone(),
                    entity: Entity::Folder(folder),
                },
            });
        }
        (EntityKind::Folder, OpAction::Update) => {
            let folder = inner.api.update_folder(&op.target_id, &op.payload).await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Folder,
                action: ChangeAction::Update,
                payload: ChangePayload::Entity(Entity::Folder(folder)),
            });
        }
        (EntityKind::Folder, OpAction::Delete) => {
            inner.api.delete_folder(&op.target_id).await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Folder,
                action: ChangeAction::Delete,
                payload: ChangePayload::Delete {
                    id: op.target_id.clone(),
                },
            });
        }
        (EntityKind::Folder, OpAction::Expand) => {
            let is_expanded = op
                .payload
                .get("is_expanded")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let folder = inner
                .api
                .update_folder_expansion(&op.target_id, is_expanded)
                .await?;
            inner.bus.send(ChangeEvent {
                kind: EntityKind::Folder,
                action: ChangeAction::Update,
                payload: ChangePayload::Entity(Entity::Folder(folder)),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_exponential_and_capped() {
        let tuning = QueueTuning {
            backoff_base: Duration::from_millis(100),
            backoff_cap: Duration::from_millis(450),
            ..Default::default()
        };
        assert_eq!(backoff_delay(&tuning, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&tuning, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(&tuning, 3), Duration::from_millis(400));
        assert_eq!(backoff_delay(&tuning, 4), Duration::from_millis(450));
        assert_eq!(backoff_delay(&tuning, 40), Duration::from_millis(450));
    }

    #[test]
    fn move_fields_pick_parent_key_by_kind() {
        let mv = MoveDescriptor {
            kind: EntityKind::Document,
            id: "d1".into(),
            from_parent: None,
            from_order: 0.0,
            to_parent: Some("f1".into()),
            to_order: 2.0,
        };
        let fields = move_fields(&mv);
        assert_eq!(fields["folder_id"], json!("f1"));
        assert_eq!(fields["order"], json!(2.0));

        let mut mv = mv;
        mv.kind = EntityKind::Folder;
        let fields = move_fields(&mv);
        assert!(fields.contains_key("parent_id"));
    }
}
