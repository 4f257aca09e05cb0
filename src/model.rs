use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Prefix of identifiers synthesized locally for not-yet-persisted entities.
/// These never appear in update/delete requests to the persistence service.
pub const TEMP_ID_PREFIX: &str = "tmp-";

pub fn temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4())
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Document,
    Folder,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Document => "document",
            EntityKind::Folder => "folder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "document" => Some(EntityKind::Document),
            "folder" => Some(EntityKind::Folder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OpAction {
    Create,
    Update,
    Delete,
    Expand,
}

impl OpAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpAction::Create => "create",
            OpAction::Update => "update",
            OpAction::Delete => "delete",
            OpAction::Expand => "expand",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(OpAction::Create),
            "update" => Some(OpAction::Update),
            "delete" => Some(OpAction::Delete),
            "expand" => Some(OpAction::Expand),
            _ => None,
        }
    }

    /// Creates are never retried (a duplicate POST would create a duplicate
    /// resource); everything else gets the bounded retry budget.
    pub fn retryable(&self) -> bool {
        !matches!(self, OpAction::Create)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Opaque ordered block list produced by the editor surface.
    pub content: Value,
    pub folder_id: Option<String>,
    pub owner_id: String,
    pub order: f64,
    pub is_locked: bool,
    pub is_deleted: bool,
    pub is_hidden_from_trash: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// None means the folder sits at the root of the tree.
    pub parent_id: Option<String>,
    pub owner_id: String,
    pub order: f64,
    pub is_expanded: bool,
    pub is_locked: bool,
    pub is_deleted: bool,
    pub is_hidden_from_trash: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for an optimistic document create; anything left
/// `None` falls back to the product defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: Option<String>,
    pub content: Option<Value>,
    pub folder_id: Option<String>,
    pub order: Option<f64>,
}

impl DocumentDraft {
    pub fn into_document(self, id: String, owner_id: String) -> Document {
        let now = Utc::now();
        Document {
            id,
            title: self.title.unwrap_or_else(|| "Untitled".to_string()),
            content: self.content.unwrap_or_else(|| json!([])),
            folder_id: self.folder_id,
            owner_id,
            order: self.order.unwrap_or(0.0),
            is_locked: false,
            is_deleted: false,
            is_hidden_from_trash: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderDraft {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub order: Option<f64>,
}

impl FolderDraft {
    pub fn into_folder(self, id: String, owner_id: String) -> Folder {
        let now = Utc::now();
        Folder {
            id,
            name: self.name.unwrap_or_else(|| "New folder".to_string()),
            parent_id: self.parent_id,
            owner_id,
            order: self.order.unwrap_or(0.0),
            is_expanded: false,
            is_locked: false,
            is_deleted: false,
            is_hidden_from_trash: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Document(Document),
    Folder(Folder),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Document(d) => &d.id,
            Entity::Folder(f) => &f.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Document(_) => EntityKind::Document,
            Entity::Folder(_) => EntityKind::Folder,
        }
    }
}

/// One reparent/reorder step of a drag-and-drop gesture. `from_*` carries the
/// pre-move position so a batch can be undone as a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveDescriptor {
    pub kind: EntityKind,
    pub id: String,
    pub from_parent: Option<String>,
    pub from_order: f64,
    pub to_parent: Option<String>,
    pub to_order: f64,
}

impl MoveDescriptor {
    /// The inverse move: applying it undoes this one.
    pub fn inverted(&self) -> Self {
        Self {
            kind: self.kind,
            id: self.id.clone(),
            from_parent: self.to_parent.clone(),
            from_order: self.to_order,
            to_parent: self.from_parent.clone(),
            to_order: self.from_order,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Replace,
    Rollback,
    Move,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangePayload {
    /// A full entity: optimistic create, confirmed update, or rollback snapshot.
    Entity(Entity),
    /// A partial, optimistic field merge.
    Fields { id: String, fields: Map<String, Value> },
    /// Server-assigned identity replacing a temporary one.
    Replace { temp_id: String, entity: Entity },
    Delete { id: String },
    Move(MoveDescriptor),
}

/// The sole channel by which the host UI learns about local mutation effects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub kind: EntityKind,
    pub action: ChangeAction,
    pub payload: ChangePayload,
}

/// A queued remote write awaiting dispatch (or confirmation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingOp {
    pub id: Uuid,
    pub kind: EntityKind,
    pub action: OpAction,
    /// Target entity id; for creates this is the temporary id.
    pub target_id: String,
    /// JSON body sent to the persistence service.
    pub payload: Value,
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
}

impl PendingOp {
    pub fn new(kind: EntityKind, action: OpAction, target_id: String, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            action,
            target_id,
            payload,
            attempt: 0,
            created_at: Utc::now(),
        }
    }
}

/// Merge a partial JSON field map onto a serializable entity.
pub fn merge_fields<T>(entity: &T, fields: &Map<String, Value>) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(obj) = &mut value {
        for (key, val) in fields {
            obj.insert(key.clone(), val.clone());
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_ids_are_recognizable() {
        let id = temp_id();
        assert!(id.starts_with(TEMP_ID_PREFIX));
        assert!(is_temp_id(&id));
        assert!(!is_temp_id("doc-42"));
    }

    #[test]
    fn draft_defaults_apply() {
        let doc = DocumentDraft::default().into_document("tmp-1".into(), "u1".into());
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.content, json!([]));
        assert_eq!(doc.order, 0.0);
        assert!(!doc.is_deleted);

        let folder = FolderDraft::default().into_folder("tmp-2".into(), "u1".into());
        assert_eq!(folder.name, "New folder");
        assert!(folder.parent_id.is_none());
    }

    #[test]
    fn inverted_move_swaps_positions() {
        let mv = MoveDescriptor {
            kind: EntityKind::Document,
            id: "d1".into(),
            from_parent: None,
            from_order: 1.0,
            to_parent: Some("f1".into()),
            to_order: 2.5,
        };
        let inv = mv.inverted();
        assert_eq!(inv.from_parent.as_deref(), Some("f1"));
        assert_eq!(inv.from_order, 2.5);
        assert!(inv.to_parent.is_none());
        assert_eq!(inv.to_order, 1.0);
        assert_eq!(inv.inverted(), mv);
    }

    #[test]
    fn merge_fields_overwrites_and_preserves() {
        let doc = DocumentDraft {
            title: Some("A".into()),
            ..Default::default()
        }
        .into_document("d1".into(), "u1".into());

        let mut fields = Map::new();
        fields.insert("title".into(), json!("B"));
        fields.insert("order".into(), json!(7.5));

        let merged: Document = merge_fields(&doc, &fields).unwrap();
        assert_eq!(merged.title, "B");
        assert_eq!(merged.order, 7.5);
        assert_eq!(merged.id, "d1");
        assert_eq!(merged.owner_id, "u1");
    }

    #[test]
    fn op_action_round_trips_through_text() {
        for action in [
            OpAction::Create,
            OpAction::Update,
            OpAction::Delete,
            OpAction::Expand,
        ] {
            assert_eq!(OpAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(OpAction::parse("nonsense"), None);
        assert!(!OpAction::Create.retryable());
        assert!(OpAction::Delete.retryable());
    }
}
