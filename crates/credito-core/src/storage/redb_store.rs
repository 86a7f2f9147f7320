//! # redb-backed Desk Storage
//!
//! A disk-backed `DeskStore` using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Records are postcard-serialized. Pendências and transitions use composite
//! keys prefixed by company name so per-company reads are range queries, and
//! company deletion can cascade with two range removals.

use crate::company::Company;
use crate::pendencia::{DocumentDirectory, PendingDoc};
use crate::store::DeskStore;
use crate::types::CreditoError;
use crate::workflow::TransitionEntry;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for companies: empresa -> serialized Company bytes.
const COMPANIES: TableDefinition<&str, &[u8]> = TableDefinition::new("companies");

/// Table for pendências: (empresa, documento) -> serialized PendingDoc bytes.
const PENDENCIAS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("pendencias");

/// Table for the transition log: (empresa, seq) -> serialized TransitionEntry
/// bytes. The sequence is global and monotonic, so per-company range reads
/// come back in append order.
const TRANSITIONS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("transitions");

/// Table for the reference document directory: one blob under a fixed key.
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// Table for metadata: key string -> value u64.
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const DIRECTORY_KEY: &str = "directory";
const NEXT_SEQ_KEY: &str = "next_transition_seq";

fn io_err(e: impl std::fmt::Display) -> CreditoError {
    CreditoError::IoError(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> CreditoError {
    CreditoError::SerializationError(e.to_string())
}

/// A disk-backed desk store using redb.
pub struct RedbStore {
    db: Database,
    /// Next transition sequence, mirrored from METADATA.
    next_seq: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a desk database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CreditoError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(COMPANIES).map_err(io_err)?;
            let _ = write_txn.open_table(PENDENCIAS).map_err(io_err)?;
            let _ = write_txn.open_table(TRANSITIONS).map_err(io_err)?;
            let _ = write_txn.open_table(DOCUMENTS).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        let read_txn = db.begin_read().map_err(io_err)?;
        let next_seq = {
            let table = read_txn.open_table(METADATA).map_err(io_err)?;
            table
                .get(NEXT_SEQ_KEY)
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        Ok(Self { db, next_seq })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), CreditoError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

impl DeskStore for RedbStore {
    fn put_company(&mut self, company: &Company) -> Result<(), CreditoError> {
        let bytes = postcard::to_allocvec(company).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(COMPANIES).map_err(io_err)?;
            table
                .insert(company.empresa.as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn get_company(&self, empresa: &str) -> Result<Option<Company>, CreditoError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(COMPANIES).map_err(io_err)?;
        match table.get(empresa).map_err(io_err)? {
            Some(data) => {
                let company: Company = postcard::from_bytes(data.value()).map_err(ser_err)?;
                Ok(Some(company))
            }
            None => Ok(None),
        }
    }

    fn list_companies(&self) -> Result<Vec<Company>, CreditoError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(COMPANIES).map_err(io_err)?;

        let mut companies = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, value) = entry.map_err(io_err)?;
            let company: Company = postcard::from_bytes(value.value()).map_err(ser_err)?;
            companies.push(company);
        }
        Ok(companies)
    }

    fn remove_company(&mut self, empresa: &str) -> Result<bool, CreditoError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed;
        {
            let mut companies = write_txn.open_table(COMPANIES).map_err(io_err)?;
            existed = companies.remove(empresa).map_err(io_err)?.is_some();

            // Cascade: pendências and transition log go with the company.
            let mut pendencias = write_txn.open_table(PENDENCIAS).map_err(io_err)?;
            let mut doc_keys: Vec<String> = Vec::new();
            for entry in pendencias.range((empresa, "")..).map_err(io_err)? {
                let (key, _) = entry.map_err(io_err)?;
                let (e, documento) = key.value();
                if e != empresa {
                    break;
                }
                doc_keys.push(documento.to_string());
            }
            for doc in &doc_keys {
                pendencias.remove((empresa, doc.as_str())).map_err(io_err)?;
            }

            let mut transitions = write_txn.open_table(TRANSITIONS).map_err(io_err)?;
            let seqs: Vec<u64> = transitions
                .range((empresa, 0u64)..=(empresa, u64::MAX))
                .map_err(io_err)?
                .map(|entry| entry.map(|(k, _)| k.value().1))
                .collect::<Result<_, _>>()
                .map_err(io_err)?;
            for seq in seqs {
                transitions.remove((empresa, seq)).map_err(io_err)?;
            }
        }
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }

    fn put_pendencia(&mut self, doc: &PendingDoc) -> Result<(), CreditoError> {
        let bytes = postcard::to_allocvec(doc).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(PENDENCIAS).map_err(io_err)?;
            table
                .insert(
                    (doc.empresa.as_str(), doc.documento.as_str()),
                    bytes.as_slice(),
                )
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn pendencias_for(&self, empresa: &str) -> Result<Vec<PendingDoc>, CreditoError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PENDENCIAS).map_err(io_err)?;

        let mut docs = Vec::new();
        for entry in table.range((empresa, "")..).map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            if key.value().0 != empresa {
                break;
            }
            let doc: PendingDoc = postcard::from_bytes(value.value()).map_err(ser_err)?;
            docs.push(doc);
        }
        Ok(docs)
    }

    fn append_transition(&mut self, entry: &TransitionEntry) -> Result<(), CreditoError> {
        let bytes = postcard::to_allocvec(entry).map_err(ser_err)?;
        let seq = self.next_seq;
        let next = seq.saturating_add(1);

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(TRANSITIONS).map_err(io_err)?;
            table
                .insert((entry.empresa.as_str(), seq), bytes.as_slice())
                .map_err(io_err)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert(NEXT_SEQ_KEY, next).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        // Update in-memory state only after successful commit.
        self.next_seq = next;
        Ok(())
    }

    fn transitions_for(&self, empresa: &str) -> Result<Vec<TransitionEntry>, CreditoError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(TRANSITIONS).map_err(io_err)?;

        let mut entries = Vec::new();
        for entry in table
            .range((empresa, 0u64)..=(empresa, u64::MAX))
            .map_err(io_err)?
        {
            let (_, value) = entry.map_err(io_err)?;
            let parsed: TransitionEntry = postcard::from_bytes(value.value()).map_err(ser_err)?;
            entries.push(parsed);
        }
        Ok(entries)
    }

    fn put_documents(&mut self, directory: &DocumentDirectory) -> Result<(), CreditoError> {
        let bytes = postcard::to_allocvec(directory).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(DOCUMENTS).map_err(io_err)?;
            table
                .insert(DIRECTORY_KEY, bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn documents(&self) -> Result<Option<DocumentDirectory>, CreditoError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(DOCUMENTS).map_err(io_err)?;
        match table.get(DIRECTORY_KEY).map_err(io_err)? {
            Some(data) => {
                let directory: DocumentDirectory =
                    postcard::from_bytes(data.value()).map_err(ser_err)?;
                Ok(Some(directory))
            }
            None => Ok(None),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
