//! `mmpmon` `fs_io_s` parsing.
//!
//! `mmpmon -p` prints one line per node and file system:
//!
//! ```text
//! _fs_io_s_ _n_ 172.29.22.78 _nn_ tiger-i23g14-op0 _rc_ 0 _t_ 1536005985 _tu_ 350611 _cl_ tiger2.gpfs _fs_ tiger2.gpfs _d_ 32 _br_ 3401130516933 _bw_ 525742920053 ...
//! ```
//!
//! All tokens after the line type are `_tag_ value` pairs.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tracing::trace;

/// Line type of the file system I/O statistics.
pub const PREFIX: &str = "_fs_io_s_";

/// Control script fed to `mmpmon`.
pub const INPUT: &str = "once nlist add *\nfs_io_s\n";

const HOST_SUFFIXES: [&str; 2] = ["-ib0", "-op0"];

/// I/O statistics of one node for one file system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IoStatRecord {
    host: String,
    fs: String,
    fields: BTreeMap<String, String>,
    timestamp_ms: Option<String>,
}

impl IoStatRecord {
    /// Returns the normalized node name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the file system name.
    #[must_use]
    pub fn fs(&self) -> &str {
        &self.fs
    }

    /// Returns the raw value of `tag`, e.g. `_br_`.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields.get(tag).map(String::as_str)
    }

    /// Returns the sample time in milliseconds since the epoch.
    #[must_use]
    pub fn timestamp_ms(&self) -> Option<&str> {
        self.timestamp_ms.as_deref()
    }
}

impl FromStr for IoStatRecord {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = s.split_whitespace();

        if tokens.next() != Some(PREFIX) {
            return Err(anyhow!("not a {PREFIX} line"));
        }

        let tokens = tokens.collect::<Vec<_>>();

        if tokens.len() % 2 != 0 {
            return Err(anyhow!("odd number of tokens: {}", tokens.len()));
        }

        let mut fields = BTreeMap::new();

        for pair in tokens.chunks_exact(2) {
            let (tag, value) = (pair[0], pair[1]);

            if !is_tag(tag) {
                return Err(anyhow!("invalid tag: {tag}"));
            }

            fields.insert(tag.to_owned(), value.to_owned());
        }

        let host = fields
            .get("_nn_")
            .or_else(|| fields.get("_n_"))
            .map(|host| normalize_host(host))
            .ok_or_else(|| anyhow!("no node tag"))?;

        let fs = fields
            .get("_fs_")
            .cloned()
            .ok_or_else(|| anyhow!("no file system tag"))?;

        let timestamp_ms = match (fields.get("_t_"), fields.get("_tu_")) {
            (Some(secs), Some(micros)) => Some(timestamp_ms(secs, micros)?),
            _ => None,
        };

        Ok(Self {
            host,
            fs,
            fields,
            timestamp_ms,
        })
    }
}

fn is_tag(token: &str) -> bool {
    token.len() > 2 && token.starts_with('_') && token.ends_with('_')
}

/// Strips the network interface suffixes from a node name.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    let mut host = host.to_owned();

    loop {
        let stripped = HOST_SUFFIXES
            .iter()
            .fold(host.clone(), |host, suffix| host.replace(suffix, ""));

        if stripped == host {
            return host;
        }

        host = stripped;
    }
}

/// Joins whole seconds and microseconds into milliseconds.
///
/// # Errors
///
/// Returns an error if either part is not an unsigned integer.
pub fn timestamp_ms(secs: &str, micros: &str) -> Result<String> {
    let secs = secs
        .parse::<u64>()
        .with_context(|| format!("invalid seconds: {secs}"))?;

    let micros = micros
        .parse::<u64>()
        .with_context(|| format!("invalid microseconds: {micros}"))?;

    let mut timestamp = format!("{secs}{micros:06}");
    timestamp.truncate(timestamp.len() - 3);

    Ok(timestamp)
}

/// I/O statistics of all nodes, by node and file system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IoStats {
    hosts: BTreeMap<String, BTreeMap<String, IoStatRecord>>,
}

impl IoStats {
    /// Parses `mmpmon` output. Lines that are not well-formed `fs_io_s`
    /// lines are skipped.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut stats = Self::default();

        for line in s.lines().filter(|line| line.starts_with(PREFIX)) {
            match line.parse() {
                Ok(record) => stats.insert(record),
                Err(error) => trace!(%error, line, "skipping mmpmon line"),
            }
        }

        stats
    }

    /// Adds a record, replacing an earlier one of the same node and file
    /// system.
    pub fn insert(&mut self, record: IoStatRecord) {
        self.hosts
            .entry(record.host.clone())
            .or_default()
            .insert(record.fs.clone(), record);
    }

    /// Returns the records sorted by node, then file system.
    pub fn records(&self) -> impl Iterator<Item = &IoStatRecord> {
        self.hosts.values().flat_map(BTreeMap::values)
    }

    /// Returns all file system names, sorted.
    #[must_use]
    pub fn filesystems(&self) -> BTreeSet<&str> {
        self.records().map(IoStatRecord::fs).collect()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let s = concat!(
            "_fs_io_s_ _n_ 172.29.22.78 _nn_ tiger-i23g14-op0 _rc_ 0 _t_ 1536005985 _tu_ 350611 _cl_ tiger2.gpfs _fs_ tiger2.gpfs _d_ 32 _br_ 3401130516933 _bw_ 525742920053 _oc_ 14848149 _cc_ 10894911 _rdc_ 1776360 _wc_ 5527815 _dir_ 37573 _iu_ 11739978\n",
            "_fs_io_s_ _n_ 172.29.22.79 _nn_ tiger-i23g15-ib0 _rc_ 0 _t_ 1536005985 _tu_ 7 _cl_ tiger2.gpfs _fs_ scratch _d_ 4 _br_ 1 _bw_ 2 _oc_ 3 _cc_ 4 _rdc_ 5 _wc_ 6 _dir_ 7 _iu_ 8\n",
            "_fs_io_s_ _n_ 172.29.22.78 _nn_ tiger-i23g14-op0 _rc_ 0 _t_ 1536005985 _tu_ 350611 _cl_ tiger2.gpfs _fs_ home _d_ 4 _br_ 10 _bw_ 20\n",
        );

        let stats = IoStats::parse(s);
        assert_eq!(stats.len(), 3);

        let records = stats.records().collect::<Vec<_>>();

        assert_eq!(records[0].host(), "tiger-i23g14");
        assert_eq!(records[0].fs(), "home");
        assert_eq!(records[1].host(), "tiger-i23g14");
        assert_eq!(records[1].fs(), "tiger2.gpfs");
        assert_eq!(records[1].get("_br_"), Some("3401130516933"));
        assert_eq!(records[1].get("_iu_"), Some("11739978"));
        assert_eq!(records[1].timestamp_ms(), Some("1536005985350"));
        assert_eq!(records[2].host(), "tiger-i23g15");
        assert_eq!(records[2].timestamp_ms(), Some("1536005985000"));

        assert_eq!(
            stats.filesystems().into_iter().collect::<Vec<_>>(),
            vec!["home", "scratch", "tiger2.gpfs"]
        );
    }

    #[test]
    fn last_line_wins() {
        let s = concat!(
            "_fs_io_s_ _n_ node1 _fs_ gpfs1 _br_ 1\n",
            "_fs_io_s_ _n_ node1 _fs_ gpfs1 _br_ 2\n",
        );

        let stats = IoStats::parse(s);
        assert_eq!(stats.len(), 1);

        let record = stats.records().next().unwrap();
        assert_eq!(record.get("_br_"), Some("2"));
        assert_eq!(record.timestamp_ms(), None);
    }

    #[test]
    fn node_address_fallback() {
        let record = "_fs_io_s_ _n_ 10.0.0.1-ib0 _fs_ gpfs1"
            .parse::<IoStatRecord>()
            .unwrap();

        assert_eq!(record.host(), "10.0.0.1");
    }

    #[test]
    fn malformed_lines() {
        let s = concat!(
            "mmpmon node 172.29.22.78 name tiger-i23g14 fs_io_s OK\n",
            "_fs_io_s_ _n_ node1 _fs_\n",
            "_fs_io_s_ _n_ node1 _br_ 1\n",
            "_fs_io_s_ _fs_ gpfs1 _br_ 1\n",
            "_fs_io_s_ _n_ node1 fs gpfs1\n",
            "_fs_io_s_ _n_ node1 _fs_ gpfs1 _t_ soon _tu_ 1\n",
            "_fs_io_s_x _n_ node1 _fs_ gpfs1\n",
            "_fs_io_s_ _n_ node2 _fs_ gpfs2 _br_ 5\n",
        );

        let stats = IoStats::parse(s);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.records().next().unwrap().host(), "node2");
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host("node-ib0-op0"), "node");
        assert_eq!(normalize_host("node-op0-ib0"), "node");
        assert_eq!(normalize_host("node-ib0"), "node");
        assert_eq!(normalize_host("node"), "node");

        for host in ["node-ib0-op0", "node-i-op0b0", "a-ib0b0"] {
            let once = normalize_host(host);
            assert_eq!(normalize_host(&once), once);
        }
    }

    #[test]
    fn timestamp() {
        assert_eq!(
            timestamp_ms("1536005985", "350611").unwrap(),
            "1536005985350"
        );
        assert_eq!(timestamp_ms("1536005985", "0").unwrap(), "1536005985000");
        assert!(timestamp_ms("1536005985", "-1").is_err());
    }
}
