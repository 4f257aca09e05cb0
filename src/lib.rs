//! Client-side optimistic synchronization for a document/folder workspace.
//!
//! UI actions apply their effect locally first (announced over [`events::ChangeBus`])
//! while the authoritative write is queued by [`queue::MutationQueue`] and
//! dispatched serially to the persistence service, rolling the local effect
//! back when the remote call ultimately fails.

pub mod api;
pub mod config;
pub mod events;
pub mod journal;
pub mod model;
pub mod net;
pub mod queue;
pub mod snapshot;

pub use api::{HttpPersistenceApi, PersistenceApi};
pub use events::ChangeBus;
pub use journal::Journal;
pub use model::{
    ChangeAction, ChangeEvent, ChangePayload, Document, DocumentDraft, Entity, EntityKind,
    Folder, FolderDraft, MoveDescriptor, PendingOp,
};
pub use net::{ManualNetwork, NetworkMonitor};
pub use queue::{MutationQueue, QueueStatus, QueueTuning};
pub use snapshot::{MemoryStore, SnapshotStore};
