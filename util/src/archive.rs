//! CSV archive files
//!
//! An [`Archiver`] writes one CSV row per serialised record into a file within the session's
//! archive directory. Column headers are taken from the first record.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

// Internal imports
use crate::session::{Session, SessionError};

pub use csv::Writer;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot get the archive path: {0}")]
    PathError(SessionError),

    #[error("Cannot open the archive file: {0}")]
    OpenError(std::io::Error),

    #[error("Cannot write the archive record: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive file: {0}")]
    FlushError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's archive root.
    ///
    /// Any existing file at the path is truncated.
    pub fn from_path<P: AsRef<Path>>(session: &Session, path: P) -> Result<Self, ArchiveError> {
        let full_path = session.arch_path(path).map_err(ArchiveError::PathError)?;

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(full_path)
            .map_err(ArchiveError::OpenError)?;

        Ok(Self {
            writer: WriterBuilder::new().has_headers(true).from_writer(file),
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        self.writer
            .serialize(record)
            .map_err(ArchiveError::WriteError)?;
        self.writer.flush().map_err(ArchiveError::FlushError)
    }
}

impl std::fmt::Debug for Archiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver").finish()
    }
}
