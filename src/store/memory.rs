/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! In-process store

use super::{ParameterKey, Record, RecordTable, Result, ResultStore};

/// Store that keeps records in memory for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    table: RecordTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

impl ResultStore for MemoryStore {
    fn save(&mut self, record: Record) -> Result<()> {
        self.table.upsert(record);
        Ok(())
    }

    fn load(&self, key: ParameterKey) -> Result<Option<Record>> {
        Ok(self.table.find(key).cloned())
    }
}
