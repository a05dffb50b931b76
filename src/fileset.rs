//! `mmlsfileset -Y` parsing.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tracing::trace;

use crate::table::{Row, Table};

/// A fileset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilesetRecord {
    fs: String,
    name: String,
    id: String,
    status: String,
    path: String,
    parent_id: String,
}

impl FilesetRecord {
    /// Returns the file system name.
    #[must_use]
    pub fn fs(&self) -> &str {
        &self.fs
    }

    /// Returns the fileset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fileset id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the status, e.g. `Linked`.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the junction path as printed.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the id of the parent fileset, `--` for the root fileset.
    #[must_use]
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            fs: row.require("filesystemName")?.into(),
            name: row.require("filesetName")?.into(),
            id: row.require("id")?.into(),
            status: row.get_or_empty("status").into(),
            path: row.get_or_empty("path").into(),
            parent_id: row.get_or_empty("parentId").into(),
        })
    }
}

/// Filesets by file system and id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filesets {
    inner: HashMap<String, BTreeMap<String, FilesetRecord>>,
}

impl Filesets {
    /// Parses `mmlsfileset -Y` output. Rows lacking the file system, name
    /// or id are skipped.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut filesets = Self::default();

        for row in Table::parse(s).rows() {
            match FilesetRecord::from_row(&row) {
                Ok(fileset) => filesets.insert(fileset),
                Err(error) => trace!(%error, "skipping mmlsfileset row"),
            }
        }

        filesets
    }

    /// Adds a fileset, replacing one with the same file system and id.
    pub fn insert(&mut self, fileset: FilesetRecord) {
        self.inner
            .entry(fileset.fs.clone())
            .or_default()
            .insert(fileset.id.clone(), fileset);
    }

    /// Adds all filesets of `other`.
    pub fn extend(&mut self, other: Self) {
        for fileset in other.inner.into_values().flat_map(BTreeMap::into_values)
        {
            self.insert(fileset);
        }
    }

    /// Returns the fileset of file system `fs` with the given id.
    #[must_use]
    pub fn get(&self, fs: &str, id: &str) -> Option<&FilesetRecord> {
        self.inner.get(fs)?.get(id)
    }

    /// Returns the number of filesets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if there are no filesets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
