//! Filesystem abstraction for `run` and `file`.
//!
//! The interpreter never touches the disk itself. Reading is delegated to a
//! [`FileSystem`] so that:
//! - the CLI can provide `OsFileSystem` (reads relative to the input file),
//! - tests can provide in-memory files,
//! - the default refuses every name.

/// Source of named files.
pub trait FileSystem {
    /// Read a file by name, returning its bytes, or `None` if it cannot be
    /// found.
    fn read_file(&self, name: &str) -> Option<Vec<u8>>;
}

/// A filesystem that never finds any files.
pub struct NullFileSystem;

impl FileSystem for NullFileSystem {
    fn read_file(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

/// An in-memory filesystem.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: Vec<(String, Vec<u8>)>,
}

impl MemoryFileSystem {
    #[must_use]
    pub const fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add or replace a file.
    #[must_use]
    pub fn with_file(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        if let Some(entry) = self.files.iter_mut().find(|(n, _)| n == name) {
            entry.1 = data;
        } else {
            self.files.push((name.to_owned(), data));
        }
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_files() {
        let fs = MemoryFileSystem::new()
            .with_file("a.ps", "1 2 add")
            .with_file("a.ps", "3");
        assert_eq!(fs.read_file("a.ps").unwrap(), b"3");
        assert!(fs.read_file("b.ps").is_none());
        assert!(NullFileSystem.read_file("a.ps").is_none());
    }
}
