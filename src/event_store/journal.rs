//! Append-only JSONL journal for the in-memory store
//!
//! Every mutation of the register log is written here before it is applied
//! in memory, so replaying the journal in order rebuilds the exact state.
//!
//! Appends are synchronous and fsynced while the store's write guard is
//! held, so writers are serialized and block a runtime worker for one
//! fsync each. The file handle stays open between appends. Meant for
//! low write rates (gate traffic), not as a high-throughput log.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{PersonSnapshot, Register, RegisterId};

use super::store::{EventStoreError, EventStoreResult};

/// One line of the journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalEntry {
    /// A new register, with its assigned id
    Inserted { register: Register },
    /// A register was matched with its counterpart
    Resolved {
        id: RegisterId,
        #[serde(rename = "counterpartId")]
        counterpart_id: RegisterId,
    },
    /// An entry and its depart were linked to each other in one step
    Matched { entry: RegisterId, depart: RegisterId },
    /// Directory sync rewrote the person snapshot
    PersonRefreshed {
        id: RegisterId,
        snapshot: PersonSnapshot,
    },
}

impl JournalEntry {
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Handle on the journal file
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    /// Opened on first append and kept for later ones
    file: Mutex<Option<File>>,
}

impl Journal {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    fn open_for_append(&self) -> EventStoreResult<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }

    /// Append one entry and fsync it
    pub fn append(&self, entry: &JournalEntry) -> EventStoreResult<()> {
        let json_line = entry.to_json_line()?;

        let mut guard = self.file.lock();
        let mut file = match guard.take() {
            Some(file) => file,
            None => self.open_for_append()?,
        };
        writeln!(file, "{}", json_line)?;
        file.sync_data()?;
        // A failed write drops the handle so the next append reopens
        *guard = Some(file);

        Ok(())
    }

    /// Load every parseable entry, in file order
    pub fn load(&self) -> EventStoreResult<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match JournalEntry::from_json_line(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(line = line_num + 1, error = %e, "skipping unparseable journal line");
                }
            }
        }

        Ok(entries)
    }

    /// Apply a single entry to the record map
    pub fn apply(
        records: &mut BTreeMap<RegisterId, Register>,
        entry: JournalEntry,
    ) -> EventStoreResult<()> {
        match entry {
            JournalEntry::Inserted { register } => {
                if records.contains_key(&register.id) {
                    return Err(EventStoreError::InvalidEntry(format!(
                        "register {} inserted twice",
                        register.id
                    )));
                }
                records.insert(register.id, register);
            }

            JournalEntry::Resolved { id, counterpart_id } => {
                let register = records.get_mut(&id).ok_or_else(|| {
                    EventStoreError::InvalidEntry(format!("resolve of unknown register {}", id))
                })?;
                register.resolved = true;
                register.counterpart_id = Some(counterpart_id);
            }

            JournalEntry::Matched { entry, depart } => {
                for id in [entry, depart] {
                    if !records.contains_key(&id) {
                        return Err(EventStoreError::InvalidEntry(format!(
                            "match of unknown register {}",
                            id
                        )));
                    }
                }
                for (id, counterpart_id) in [(entry, depart), (depart, entry)] {
                    if let Some(register) = records.get_mut(&id) {
                        register.resolved = true;
                        register.counterpart_id = Some(counterpart_id);
                    }
                }
            }

            JournalEntry::PersonRefreshed { id, snapshot } => {
                if let Some(register) = records.get_mut(&id) {
                    register.apply_snapshot(snapshot);
                }
            }
        }

        Ok(())
    }

    /// Rebuild the record map. Returns the records and the highest id seen.
    pub fn replay(&self) -> EventStoreResult<(BTreeMap<RegisterId, Register>, RegisterId)> {
        let mut records = BTreeMap::new();
        for entry in self.load()? {
            Self::apply(&mut records, entry)?;
        }
        let max_id = records.keys().next_back().copied().unwrap_or(0);
        Ok((records, max_id))
    }
}
