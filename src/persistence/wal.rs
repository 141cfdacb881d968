//! Write-Ahead Log (WAL) for crash recovery.
//!
//! Each entry is written as: [length: u32][crc32: u32][payload: bincode(WalEntry)]
//! The WAL is append-only and fsynced after each write.

use crate::error::{AssistantError, Result};
use crate::persistence::serialization;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// A single WAL entry.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum WalEntry {
    Upsert {
        id: String,
        text: String,
        embedding: Vec<f32>,
    },
    Delete {
        id: String,
    },
    Checkpoint,
}

/// Write-Ahead Log file manager.
pub struct WriteAheadLog {
    path: PathBuf,
    file: File,
}

impl WriteAheadLog {
    /// Open (or create) a WAL file at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Append an entry to the WAL and fsync.
    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        let payload = serialization::to_bincode(entry)?;
        let crc = crc32fast::hash(&payload);
        let len = payload.len() as u32;

        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.write_all(&payload)?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Replay all valid entries from the WAL.
    /// Stops at the first corrupted or incomplete entry (crash tolerance).
    pub fn replay(&self) -> Result<Vec<WalEntry>> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();

        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(AssistantError::IoError(e)),
            }
            let len = u32::from_le_bytes(len_buf) as usize;

            let mut crc_buf = [0u8; 4];
            if reader.read_exact(&mut crc_buf).is_err() {
                break;
            }
            let expected_crc = u32::from_le_bytes(crc_buf);

            let mut payload = vec![0u8; len];
            if reader.read_exact(&mut payload).is_err() {
                break;
            }

            if crc32fast::hash(&payload) != expected_crc {
                tracing::warn!(path = %self.path.display(), "WAL checksum mismatch, stopping replay");
                break;
            }

            match serialization::from_bincode::<WalEntry>(&payload) {
                Ok(entry) => entries.push(entry),
                Err(_) => break,
            }
        }

        Ok(entries)
    }

    /// Truncate the WAL file (after a successful checkpoint).
    pub fn truncate(&mut self) -> Result<()> {
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(())
    }
}
