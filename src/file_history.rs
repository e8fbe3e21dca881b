use std::path::Path;

use anyhow::Context as _;

use crate::file_metadata::FileDescriptor;

/// Every attachment processed so far, oldest first.
///
/// The history is an audit trail rather than a filter: a link that was
/// fetched before is fetched again if it is still unread on the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistory {
    entries: Vec<FileDescriptor>,
}

impl FileHistory {
    /// Loads the ledger. A missing or blank file is an empty history.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let entries: Vec<FileDescriptor> = crate::store::read_json(path)
            .with_context(|| format!("load file history: {}", path.display()))?
            .unwrap_or_default();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FileDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_link(&self, link: &str) -> bool {
        self.entries.iter().any(|entry| entry.link == link)
    }

    pub fn append(&mut self, file: FileDescriptor) {
        self.entries.push(file);
    }

    /// Rewrites the whole ledger file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        crate::store::write_json_atomic(path, &self.entries)
            .with_context(|| format!("save file history: {}", path.display()))?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "saved file history");
        Ok(())
    }
}
