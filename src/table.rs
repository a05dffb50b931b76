//! Colon-delimited `-Y` output.
//!
//! The first line names the columns, every further line is matched to it by
//! position:
//!
//! ```text
//! mmlsfileset::HEADER:version:reserved:reserved:filesystemName:filesetName:id:...
//! mmlsfileset::0:1:::gpfs1:root:0:...
//! ```

use std::collections::HashMap;

use anyhow::{anyhow, Result};

/// A parsed `-Y` table borrowing from the command output.
#[derive(Debug, Default)]
pub struct Table<'a> {
    columns: HashMap<&'a str, usize>,
    rows: Vec<Vec<&'a str>>,
}

impl<'a> Table<'a> {
    /// Parses `s`. Empty lines and repetitions of the header are skipped.
    #[must_use]
    pub fn parse(s: &'a str) -> Self {
        let mut lines = s.lines().filter(|line| !line.trim().is_empty());

        let Some(header) = lines.next() else {
            return Self::default();
        };

        let mut columns = HashMap::new();

        for (i, column) in header.split(':').enumerate() {
            if !column.is_empty() {
                columns.entry(column).or_insert(i);
            }
        }

        let rows = lines
            .filter(|line| *line != header)
            .map(|line| line.split(':').collect())
            .collect();

        Self { columns, rows }
    }

    /// Returns the rows in output order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_, 'a>> {
        self.rows.iter().map(move |tokens| Row {
            table: self,
            tokens,
        })
    }
}

/// A data line of a [`Table`].
#[derive(Clone, Copy, Debug)]
pub struct Row<'t, 'a> {
    table: &'t Table<'a>,
    tokens: &'t [&'a str],
}

impl<'a> Row<'_, 'a> {
    /// Returns the value of `column`, if both the column and the value
    /// exist.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let i = *self.table.columns.get(column)?;
        self.tokens.get(i).copied()
    }

    /// Returns the value of `column`, or the empty string.
    #[must_use]
    pub fn get_or_empty(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or_default()
    }

    /// Returns the value of `column`.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is unknown or the row is too short.
    pub fn require(&self, column: &str) -> Result<&'a str> {
        self.get(column)
            .ok_or_else(|| anyhow!("no {column} field"))
    }

    /// Returns the value of `column` parsed to an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing or not an integer.
    pub fn require_u64(&self, column: &str) -> Result<u64> {
        let value = self.require(column)?;

        value
            .parse()
            .map_err(|_| anyhow!("invalid {column} field: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let s = concat!(
            "cmd::HEADER:version:name:size:\n",
            "cmd::0:1:foo:42:\n",
            "\n",
            "cmd::HEADER:version:name:size:\n",
            "cmd::0:1:bar\n",
        );

        let table = Table::parse(s);

        let rows = table.rows().collect::<Vec<_>>();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].get("name"), Some("foo"));
        assert_eq!(rows[0].require_u64("size").unwrap(), 42);
        assert_eq!(rows[0].get("unknown"), None);

        assert_eq!(rows[1].get("name"), Some("bar"));
        assert_eq!(rows[1].get("size"), None);
        assert_eq!(rows[1].get_or_empty("size"), "");
        assert!(rows[1].require("size").is_err());
    }

    #[test]
    fn invalid_number() {
        let table = Table::parse("name:size\nfoo:lots\n");
        let row = table.rows().next().unwrap();

        let error = row.require_u64("size").unwrap_err().to_string();
        assert_eq!(error, "invalid size field: lots");
    }

    #[test]
    fn empty() {
        let table = Table::parse("");
        assert_eq!(table.rows().count(), 0);
    }
}
