//! Relational persistence for VeggieScan.
//!
//! [`store::VeggieStore`] owns the SeaORM connection and exposes user and
//! scan-record operations. The scan table doubles as the content-hash cache:
//! [`store::VeggieStore::find_scan_by_hash`] is the only lookup the pipeline
//! performs before calling the vision model.

pub mod auth;
pub mod entities;
pub mod error;
pub mod store;

pub use error::StorageError;
pub use store::VeggieStore;
