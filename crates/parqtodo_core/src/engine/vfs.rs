//! Engine-owned in-memory files.

use bytes::Bytes;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct VirtualFs {
    files: HashMap<String, Bytes>,
}

impl VirtualFs {
    /// Registers or replaces a file.
    pub(crate) fn put(&mut self, name: &str, buffer: Bytes) {
        self.files.insert(name.to_string(), buffer);
    }

    pub(crate) fn get(&self, name: &str) -> Option<Bytes> {
        self.files.get(name).cloned()
    }

    pub(crate) fn remove(&mut self, name: &str) -> bool {
        self.files.remove(name).is_some()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names = self.files.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}
