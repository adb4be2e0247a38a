//! The file table.
//!
//! File objects are indices into a [`FileTable`]. Entries 0-2 are the
//! standard streams; everything else is an in-memory byte buffer opened by
//! `run`, `file` or the driver. Files are not VM objects, so `restore`
//! leaves them alone.

use crate::error::{ErrorKind, InterpResult, InterpreterError};
use crate::types::FileId;

/// What a file is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Stdin,
    Stdout,
    Stderr,
    /// Read-only buffer.
    Memory,
}

/// One open (or closed) file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub kind: FileKind,
    data: Vec<u8>,
    pos: usize,
    pub open: bool,
}

impl FileEntry {
    /// Unread bytes.
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        if self.open {
            self.data.get(self.pos..).unwrap_or_default()
        } else {
            &[]
        }
    }

    /// Whole buffer and the read position, for the scanner.
    #[must_use]
    pub fn buffer(&self) -> (&[u8], usize) {
        (&self.data, self.pos)
    }

    pub const fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self.kind, FileKind::Stdout | FileKind::Stderr)
    }

    /// Read one byte; `None` at end of file or when closed.
    pub fn read_byte(&mut self) -> Option<u8> {
        if !self.open {
            return None;
        }
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    /// Put the last byte back (after a lookahead).
    pub const fn unread(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }
}

#[derive(Debug, Clone)]
pub struct FileTable {
    files: Vec<FileEntry>,
}

impl FileTable {
    pub const STDIN: FileId = FileId(0);
    pub const STDOUT: FileId = FileId(1);
    pub const STDERR: FileId = FileId(2);

    #[must_use]
    pub fn new(stdin: Vec<u8>) -> Self {
        let std = |name: &str, kind, data| FileEntry {
            name: name.into(),
            kind,
            data,
            pos: 0,
            open: true,
        };
        Self {
            files: vec![
                std("%stdin", FileKind::Stdin, stdin),
                std("%stdout", FileKind::Stdout, Vec::new()),
                std("%stderr", FileKind::Stderr, Vec::new()),
            ],
        }
    }

    /// Open a read-only buffer.
    pub fn open(&mut self, name: &str, data: Vec<u8>) -> FileId {
        self.files.push(FileEntry {
            name: name.into(),
            kind: FileKind::Memory,
            data,
            pos: 0,
            open: true,
        });
        FileId(self.files.len() - 1)
    }

    pub fn get(&self, id: FileId) -> InterpResult<&FileEntry> {
        self.files
            .get(id.0)
            .ok_or_else(|| InterpreterError::new(ErrorKind::IoError, "unknown file"))
    }

    pub fn get_mut(&mut self, id: FileId) -> InterpResult<&mut FileEntry> {
        self.files
            .get_mut(id.0)
            .ok_or_else(|| InterpreterError::new(ErrorKind::IoError, "unknown file"))
    }

    /// Close a file. The standard streams stay open.
    pub fn close(&mut self, id: FileId) -> InterpResult<()> {
        let entry = self.get_mut(id)?;
        if entry.kind == FileKind::Memory {
            entry.open = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_and_closing() {
        let mut t = FileTable::new(Vec::new());
        let id = t.open("x", b"ab".to_vec());
        let f = t.get_mut(id).unwrap();
        assert_eq!(f.read_byte(), Some(b'a'));
        assert_eq!(f.remaining(), b"b");
        f.unread();
        assert_eq!(f.remaining(), b"ab");
        t.close(id).unwrap();
        let f = t.get_mut(id).unwrap();
        assert_eq!(f.read_byte(), None);
        assert!(f.remaining().is_empty());
    }

    #[test]
    fn standard_streams() {
        let mut t = FileTable::new(b"in".to_vec());
        assert!(t.get(FileTable::STDOUT).unwrap().is_writable());
        assert!(!t.get(FileTable::STDIN).unwrap().is_writable());
        t.close(FileTable::STDIN).unwrap();
        assert_eq!(t.get_mut(FileTable::STDIN).unwrap().read_byte(), Some(b'i'));
        assert!(t.get(FileId(99)).is_err());
    }
}
