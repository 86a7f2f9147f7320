//! # Storage Backends
//!
//! Persistent storage for the desk, backed by the redb embedded database.

pub mod redb_store;

pub use redb_store::RedbStore;
