/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Persistence of converged solutions
//!
//! A [`ResultStore`] maps a [`ParameterKey`] to the densities and energy of
//! one solution. Saving overwrites the first record with the same key or
//! appends a new one; loading is an exact key match. Records are never
//! deleted.

mod errors;
mod key;
mod memory;
mod table;

pub use errors::{Result, StoreError};
pub use key::{ParameterKey, ParameterSet, StructureKey};
pub use memory::MemoryStore;
pub use table::TableStore;

use serde::{Deserialize, Serialize};

/// One stored solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: ParameterKey,
    pub coulomb: f64,
    pub electrons_up: usize,
    pub electrons_down: usize,
    pub density_up: Vec<f64>,
    pub density_down: Vec<f64>,
    pub total_energy: f64,
}

/// Key-value store of solutions
pub trait ResultStore {
    /// Insert or overwrite the record for `record.key`
    fn save(&mut self, record: Record) -> Result<()>;

    /// Record stored under `key`, if any
    fn load(&self, key: ParameterKey) -> Result<Option<Record>>;
}

const TABLE_VERSION: u32 = 1;

/// Ordered list of records with first-match-wins lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RecordTable {
    version: u32,
    records: Vec<Record>,
}

impl Default for RecordTable {
    fn default() -> Self {
        Self {
            version: TABLE_VERSION,
            records: Vec::new(),
        }
    }
}

impl RecordTable {
    fn check_version(&self) -> Result<()> {
        if self.version != TABLE_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported table version {}",
                self.version
            )));
        }
        Ok(())
    }

    /// Returns `true` when the record was appended rather than overwritten
    fn upsert(&mut self, record: Record) -> bool {
        match self.records.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => {
                *existing = record;
                false
            }
            None => {
                self.records.push(record);
                true
            }
        }
    }

    fn find(&self, key: ParameterKey) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
