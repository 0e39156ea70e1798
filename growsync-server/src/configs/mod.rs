pub mod schema;
pub mod settings;
pub mod storage;

pub use schema::SchemaManager;
pub use settings::{Auth, Database, Posting, Settings};
pub use storage::Storage;
