/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Single-file JSON table of solutions
//!
//! Writers serialize through an advisory lock on a sidecar `.lock` file,
//! then replace the table by writing a temporary file and renaming it over
//! the original. Readers therefore see either the old or the new table.
//!
//! The lock belongs to the open file handle, so the operating system
//! releases it when a writer exits or is killed. A leftover `.lock` file
//! on disk is harmless.

use super::{ParameterKey, Record, RecordTable, Result, ResultStore, StoreError};
use fs2::FileExt;
use log::{debug, info};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
const LOCK_POLL: Duration = Duration::from_millis(20);

/// Persistent store backed by one JSON file
#[derive(Debug, Clone)]
pub struct TableStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl TableStore {
    /// Open the table at `path`, creating an empty one if it does not exist
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        };

        if store.path.exists() {
            let table = store.read_table()?;
            info!(
                "Appending to {} ({} records)",
                store.path.display(),
                table.len()
            );
        } else {
            if let Some(parent) = store.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let _lock = TableLock::acquire(&store.lock_path(), store.lock_timeout)?;
            store.write_table(&RecordTable::default())?;
            info!("Initiating {}", store.path.display());
        }

        Ok(store)
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records currently in the file
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_table()?.len())
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }

    fn read_table(&self) -> Result<RecordTable> {
        if !self.path.exists() {
            return Ok(RecordTable::default());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let table: RecordTable = serde_json::from_reader(reader)?;
        table.check_version()?;
        Ok(table)
    }

    fn write_table(&self, table: &RecordTable) -> Result<()> {
        let tmp = sibling(&self.path, "tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, table)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ResultStore for TableStore {
    fn save(&mut self, record: Record) -> Result<()> {
        let _lock = TableLock::acquire(&self.lock_path(), self.lock_timeout)?;
        let mut table = self.read_table()?;
        let key = record.key;
        if table.upsert(record) {
            debug!("Appended record {} to {}", key, self.path.display());
        } else {
            debug!("Overwrote record {} in {}", key, self.path.display());
        }
        self.write_table(&table)
    }

    fn load(&self, key: ParameterKey) -> Result<Option<Record>> {
        Ok(self.read_table()?.find(key).cloned())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Exclusive lock held while the guard is alive
struct TableLock {
    file: File,
}

impl TableLock {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file }),
                Err(e) if is_contended(&e) => {
                    if start.elapsed() >= timeout {
                        return Err(StoreError::Locked(path.to_path_buf()));
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(error: &io::Error) -> bool {
    error.kind() == ErrorKind::WouldBlock
        || error.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runs").join("results.json");
        let store = TableStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.len().unwrap(), 0);
        assert!(TableLock::acquire(&store.lock_path(), Duration::ZERO).is_ok());
    }

    #[test]
    fn test_held_lock_times_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let mut store = TableStore::open(&path)
            .unwrap()
            .with_lock_timeout(Duration::from_millis(50));

        let _held = TableLock::acquire(&store.lock_path(), Duration::ZERO).unwrap();
        let record = Record {
            key: "00000000000000ff".parse().unwrap(),
            coulomb: 1.0,
            electrons_up: 1,
            electrons_down: 0,
            density_up: vec![1.0],
            density_down: vec![0.0],
            total_energy: 0.0,
        };
        assert!(matches!(store.save(record), Err(StoreError::Locked(_))));
    }

    #[test]
    fn test_leftover_lock_file_does_not_block() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(sibling(&path, "lock"), "").unwrap();

        let mut store = TableStore::open(&path)
            .unwrap()
            .with_lock_timeout(Duration::from_millis(200));
        let record = Record {
            key: "00000000000000ff".parse().unwrap(),
            coulomb: 1.0,
            electrons_up: 1,
            electrons_down: 0,
            density_up: vec![1.0],
            density_down: vec![0.0],
            total_energy: 0.0,
        };
        store.save(record).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.lock");
        let first = TableLock::acquire(&path, Duration::ZERO).unwrap();
        assert!(matches!(
            TableLock::acquire(&path, Duration::ZERO),
            Err(StoreError::Locked(_))
        ));
        drop(first);
        assert!(TableLock::acquire(&path, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            TableStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
