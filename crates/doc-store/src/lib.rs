pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use document::{Document, Precondition, Revision, WriteResult};
pub use error::{DocStoreError, Result};
pub use memory::InMemoryDocStore;
pub use postgres::PostgresDocStore;
pub use query::{DocQuery, Filter, FilterOp};
pub use store::{BatchOp, DocumentStore, DocumentStoreExt};
