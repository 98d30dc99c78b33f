// Infra implementations of the auto-moderation ports.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryMessageArchive;
pub use sqlite_store::SqliteAutoModStore;
