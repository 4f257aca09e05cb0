use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::model::{
    merge_fields, ChangeEvent, ChangePayload, Document, Entity, Folder, MoveDescriptor,
};

/// Read-only view of the host's entity state, consulted at mutation time to
/// capture rollback snapshots. The queue itself never owns UI-visible lists.
pub trait SnapshotStore: Send + Sync {
    fn document(&self, id: &str) -> Option<Document>;
    fn folder(&self, id: &str) -> Option<Folder>;
}

/// Reference in-memory state container that applies queue change events.
/// Real hosts usually have their own store; this one backs tests and small
/// embedders.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    documents: HashMap<String, Document>,
    folders: HashMap<String, Folder>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document(&self, doc: Document) {
        self.inner
            .lock()
            .expect("store lock")
            .documents
            .insert(doc.id.clone(), doc);
    }

    pub fn insert_folder(&self, folder: Folder) {
        self.inner
            .lock()
            .expect("store lock")
            .folders
            .insert(folder.id.clone(), folder);
    }

    pub fn documents(&self) -> Vec<Document> {
        let mut docs: Vec<_> = self
            .inner
            .lock()
            .expect("store lock")
            .documents
            .values()
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.order.total_cmp(&b.order));
        docs
    }

    pub fn folders(&self) -> Vec<Folder> {
        let mut folders: Vec<_> = self
            .inner
            .lock()
            .expect("store lock")
            .folders
            .values()
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.order.total_cmp(&b.order));
        folders
    }

    /// Apply one queue change event to the local state.
    pub fn apply(&self, event: &ChangeEvent) {
        let mut inner = self.inner.lock().expect("store lock");
        match &event.payload {
            ChangePayload::Entity(entity) => inner.upsert(entity.clone()),
            ChangePayload::Fields { id, fields } => {
                let merged = match (inner.documents.get(id), inner.folders.get(id)) {
                    (Some(doc), _) => merge_fields(doc, fields).map(Entity::Document),
                    (_, Some(folder)) => merge_fields(folder, fields).map(Entity::Folder),
                    (None, None) => {
                        debug!(id, "field update for unknown entity; ignoring");
                        return;
                    }
                };
                match merged {
                    Ok(entity) => inner.upsert(entity),
                    Err(err) => debug!(id, ?err, "field merge failed; ignoring"),
                }
            }
            ChangePayload::Replace { temp_id, entity } => {
                inner.documents.remove(temp_id);
                inner.folders.remove(temp_id);
                inner.upsert(entity.clone());
            }
            ChangePayload::Delete { id } => {
                if let Some(doc) = inner.documents.get_mut(id) {
                    doc.is_deleted = true;
                } else if let Some(folder) = inner.folders.get_mut(id) {
                    folder.is_deleted = true;
                }
            }
            ChangePayload::Move(mv) => inner.apply_move(mv),
        }
    }
}

impl StoreInner {
    fn upsert(&mut self, entity: Entity) {
        match entity {
            Entity::Document(doc) => {
                self.documents.insert(doc.id.clone(), doc);
            }
            Entity::Folder(folder) => {
                self.folders.insert(folder.id.clone(), folder);
            }
        }
    }

    fn apply_move(&mut self, mv: &MoveDescriptor) {
        if let Some(doc) = self.documents.get_mut(&mv.id) {
            doc.folder_id = mv.to_parent.clone();
            doc.order = mv.to_order;
        } else if let Some(folder) = self.folders.get_mut(&mv.id) {
            folder.parent_id = mv.to_parent.clone();
            folder.order = mv.to_order;
        } else {
            debug!(id = %mv.id, "move for unknown entity; ignoring");
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn document(&self, id: &str) -> Option<Document> {
        self.inner.lock().expect("store lock").documents.get(id).cloned()
    }

    fn folder(&self, id: &str) -> Option<Folder> {
        self.inner.lock().expect("store lock").folders.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeAction, DocumentDraft, EntityKind, FolderDraft};
    use serde_json::{json, Map};

    fn doc(id: &str, title: &str) -> Document {
        DocumentDraft {
            title: Some(title.into()),
            ..Default::default()
        }
        .into_document(id.into(), "u1".into())
    }

    fn event(action: ChangeAction, payload: ChangePayload) -> ChangeEvent {
        ChangeEvent {
            kind: EntityKind::Document,
            action,
            payload,
        }
    }

    #[test]
    fn create_then_field_update() {
        let store = MemoryStore::new();
        store.apply(&event(
            ChangeAction::Create,
            ChangePayload::Entity(Entity::Document(doc("d1", "A"))),
        ));

        let mut fields = Map::new();
        fields.insert("title".into(), json!("B"));
        store.apply(&event(
            ChangeAction::Update,
            ChangePayload::Fields {
                id: "d1".into(),
                fields,
            },
        ));

        assert_eq!(store.document("d1").unwrap().title, "B");
    }

    #[test]
    fn replace_swaps_temporary_identity() {
        let store = MemoryStore::new();
        store.insert_document(doc("tmp-1", "draft"));

        store.apply(&event(
            ChangeAction::Replace,
            ChangePayload::Replace {
                temp_id: "tmp-1".into(),
                entity: Entity::Document(doc("d9", "draft")),
            },
        ));

        assert!(store.document("tmp-1").is_none());
        assert_eq!(store.document("d9").unwrap().title, "draft");
    }

    #[test]
    fn delete_is_soft_and_rollback_restores() {
        let store = MemoryStore::new();
        let original = doc("d1", "keep me");
        store.insert_document(original.clone());

        store.apply(&event(
            ChangeAction::Delete,
            ChangePayload::Delete { id: "d1".into() },
        ));
        assert!(store.document("d1").unwrap().is_deleted);

        store.apply(&event(
            ChangeAction::Rollback,
            ChangePayload::Entity(Entity::Document(original.clone())),
        ));
        assert_eq!(store.document("d1").unwrap(), original);
    }

    #[test]
    fn move_updates_parent_and_order() {
        let store = MemoryStore::new();
        store.insert_folder(FolderDraft::default().into_folder("f1".into(), "u1".into()));
        store.insert_document(doc("d1", "A"));

        store.apply(&ChangeEvent {
            kind: EntityKind::Document,
            action: ChangeAction::Move,
            payload: ChangePayload::Move(MoveDescriptor {
                kind: EntityKind::Document,
                id: "d1".into(),
                from_parent: None,
                from_order: 0.0,
                to_parent: Some("f1".into()),
                to_order: 3.5,
            }),
        });

        let moved = store.document("d1").unwrap();
        assert_eq!(moved.folder_id.as_deref(), Some("f1"));
        assert_eq!(moved.order, 3.5);
    }
}
