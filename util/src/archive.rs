//! CSV archiving
//!
//! An [`Archiver`] writes one CSV file in the session's archive directory.
//! Each call to [`Archiver::serialise`] appends one row, the header is derived
//! from the first record.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::path::Path;
use std::fs::{self, File};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
pub struct Archiver {
    writer: Writer<File>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    CreateError(std::io::Error),

    #[error("Cannot write the record: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive file: {0}")]
    FlushError(std::io::Error)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        Self::from_full_path(session.arch_root.join(path))
    }

    /// Create a new archiver writing to the given path, truncating any
    /// existing file.
    pub fn from_full_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::CreateError)?;
        }

        let file = File::create(path).map_err(ArchiveError::CreateError)?;

        Ok(Self {
            writer: WriterBuilder::new()
                .has_headers(true)
                .from_writer(file)
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        self.writer.serialize(record).map_err(ArchiveError::WriteError)?;
        self.writer.flush().map_err(ArchiveError::FlushError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        step: usize,
        cte: f64
    }

    #[test]
    fn test_archiver_writes_header_and_rows() {
        let path = std::env::temp_dir()
            .join(format!("util_archive_test_{}", std::process::id()))
            .join("rows.csv");

        let mut arch = Archiver::from_full_path(&path).unwrap();
        arch.serialise(Row { step: 1, cte: 0.5 }).unwrap();
        arch.serialise(Row { step: 2, cte: -0.25 }).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "step,cte\n1,0.5\n2,-0.25\n");

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
