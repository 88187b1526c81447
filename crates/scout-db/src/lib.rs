pub mod backend;
pub mod json_store;
pub mod retention;
pub mod sqlite;

pub use backend::Store;
pub use json_store::JsonRunStore;
pub use retention::plan_retention;
pub use sqlite::SqliteRunStore;
