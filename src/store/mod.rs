//! Persistence of the summary document and its backups.

pub mod backup;
pub mod error;
pub mod legacy;
pub mod summary_store;

pub use error::StoreError;
pub use summary_store::SummaryStore;
