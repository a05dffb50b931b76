//! `mmlspool` parsing.
//!
//! Pool lines have this fixed column layout:
//!
//! ```text
//! Name                    Id   BlkSize Data Meta Total Data in (KB)   Free Data in (KB)   Total Meta in (KB)    Free Meta in (KB)
//! system                   0      8 MB   no  yes              0              0 (  0%)    25004867584     9798959104 ( 39%)
//! ```
//!
//! That is: name, numeric id, block size with unit, data and metadata
//! `yes`/`no` flags, total and free data kilobytes, free data percentage in
//! parentheses, total and free metadata kilobytes and an optional free
//! metadata percentage. Any line not matching this layout as a whole, like
//! the banner and the header, is skipped.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

static POOL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<name>\S+)\s+",
        r"(?P<id>\d+)\s+",
        r"(?P<block_size>\d+\s*[KMGTP]?B)\s+",
        r"(?P<data>yes|no)\s+",
        r"(?P<meta>yes|no)\s+",
        r"(?P<total_data>\d+)\s+",
        r"(?P<free_data>\d+)\s+",
        r"\(\s*(?P<free_data_percent>\d+)%\)\s+",
        r"(?P<total_meta>\d+)\s+",
        r"(?P<free_meta>\d+)",
        r"(?:\s+\(\s*\d+%\))?\s*$",
    ))
    .expect("valid mmlspool line regex")
});

/// Pool size.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default,
)]
pub struct Size {
    total_kb: u64,
    free_kb: u64,
}

impl Size {
    /// Returns total size in kilobytes.
    #[must_use]
    pub const fn total_kb(&self) -> u64 {
        self.total_kb
    }

    /// Returns free size in kilobytes.
    #[must_use]
    pub const fn free_kb(&self) -> u64 {
        self.free_kb
    }

    /// Returns the used percentage, `0` for an empty pool.
    #[must_use]
    pub const fn used_percent(&self) -> u64 {
        if self.total_kb == 0 {
            return 0;
        }

        let used_kb = self.total_kb.saturating_sub(self.free_kb);
        let x = used_kb.saturating_mul(100);
        let y = self.total_kb;

        x / y
    }
}

/// A storage pool of a file system.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PoolRecord {
    fs: String,
    name: String,
    id: u64,
    block_size: String,
    holds_data: bool,
    holds_meta: bool,
    data: Size,
    meta: Size,
    free_data_percent: u64,
}

impl PoolRecord {
    /// Returns the file system name.
    #[must_use]
    pub fn fs(&self) -> &str {
        &self.fs
    }

    /// Returns the pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pool id.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the block size as printed, e.g. `8 MB`.
    #[must_use]
    pub fn block_size(&self) -> &str {
        &self.block_size
    }

    /// Returns `true` if the pool holds object data.
    #[must_use]
    pub const fn holds_data(&self) -> bool {
        self.holds_data
    }

    /// Returns `true` if the pool holds metadata.
    #[must_use]
    pub const fn holds_meta(&self) -> bool {
        self.holds_meta
    }

    /// Returns the object data size, if the pool holds object data.
    #[must_use]
    pub const fn data(&self) -> Option<&Size> {
        if self.holds_data {
            Some(&self.data)
        } else {
            None
        }
    }

    /// Returns the metadata size, if the pool holds metadata.
    #[must_use]
    pub const fn meta(&self) -> Option<&Size> {
        if self.holds_meta {
            Some(&self.meta)
        } else {
            None
        }
    }

    /// Returns the data size columns regardless of the data flag.
    #[must_use]
    pub const fn data_columns(&self) -> &Size {
        &self.data
    }

    /// Returns the metadata size columns regardless of the metadata flag.
    #[must_use]
    pub const fn meta_columns(&self) -> &Size {
        &self.meta
    }

    /// Returns the free data percentage as printed.
    #[must_use]
    pub const fn free_data_percent(&self) -> u64 {
        self.free_data_percent
    }

    /// Returns the roles of this pool: `data,meta`, `data`, `meta` or empty.
    #[must_use]
    pub const fn pool_type(&self) -> &'static str {
        match (self.holds_data, self.holds_meta) {
            (true, true) => "data,meta",
            (true, false) => "data",
            (false, true) => "meta",
            (false, false) => "",
        }
    }

    fn from_line(fs: &str, line: &str) -> Option<Self> {
        let caps = POOL_LINE.captures(line)?;

        Some(Self {
            fs: fs.into(),
            name: caps["name"].to_owned(),
            id: number(&caps, "id")?,
            block_size: caps["block_size"].to_owned(),
            holds_data: &caps["data"] == "yes",
            holds_meta: &caps["meta"] == "yes",
            data: Size {
                total_kb: number(&caps, "total_data")?,
                free_kb: number(&caps, "free_data")?,
            },
            meta: Size {
                total_kb: number(&caps, "total_meta")?,
                free_kb: number(&caps, "free_meta")?,
            },
            free_data_percent: number(&caps, "free_data_percent")?,
        })
    }
}

fn number(caps: &Captures, name: &str) -> Option<u64> {
    caps.name(name)?.as_str().parse().ok()
}

/// Parses the `mmlspool` output of file system `fs`.
#[must_use]
pub fn parse_mmlspool_output(fs: &str, s: &str) -> Vec<PoolRecord> {
    let mut pools = Vec::with_capacity(16);

    for line in s.lines() {
        match PoolRecord::from_line(fs, line) {
            Some(pool) => pools.push(pool),
            None => trace!(fs, line, "skipping mmlspool line"),
        }
    }

    pools
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = concat!(
        "Storage pools in file system at '/gpfs1':\n",
        "Name                    Id   BlkSize Data Meta Total Data in (KB)   Free Data in (KB)   Total Meta in (KB)    Free Meta in (KB)\n",
        "system                   0      8 MB   no  yes              0              0 (  0%)    25004867584     9798959104 ( 39%)\n",
        "nvme                 65537      8 MB  yes   no   162531639296   114505474048 ( 70%)              0              0 (  0%)\n",
        "nlsas                65538      8 MB  yes   no  1997953957888  1981410271232 ( 99%)              0              0 (  0%)\n",
        "dangerzone           65539    256 KB  yes  yes             42             42 (100%)             42             42 (100%)\n",
    );

    #[test]
    fn parse() {
        let pools = parse_mmlspool_output("gpfs1", OUTPUT);
        assert_eq!(pools.len(), 4);

        assert_eq!(
            pools[0],
            PoolRecord {
                fs: "gpfs1".into(),
                name: "system".into(),
                id: 0,
                block_size: "8 MB".into(),
                holds_data: false,
                holds_meta: true,
                data: Size {
                    total_kb: 0,
                    free_kb: 0,
                },
                meta: Size {
                    total_kb: 25_004_867_584,
                    free_kb: 9_798_959_104,
                },
                free_data_percent: 0,
            }
        );

        assert_eq!(pools[0].pool_type(), "meta");
        assert_eq!(pools[0].data(), None);

        assert_eq!(pools[1].name(), "nvme");
        assert_eq!(pools[1].id(), 65537);
        assert_eq!(pools[1].pool_type(), "data");
        assert_eq!(pools[1].free_data_percent(), 70);
        assert_eq!(pools[1].data().unwrap().used_percent(), 29);
        assert_eq!(pools[1].meta(), None);

        assert_eq!(pools[2].data_columns().total_kb(), 1_997_953_957_888);
        assert_eq!(pools[2].data_columns().free_kb(), 1_981_410_271_232);

        assert_eq!(pools[3].block_size(), "256 KB");
        assert_eq!(pools[3].pool_type(), "data,meta");
        assert_eq!(pools[3].meta().unwrap().total_kb(), 42);
    }

    #[test]
    fn neither_data_nor_meta() {
        let line = "archive 65540 4 MB no no 1 1 (100%) 0 0 (  0%)";
        let pools = parse_mmlspool_output("gpfs1", line);

        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].pool_type(), "");
    }

    #[test]
    fn missing_meta_percentage() {
        let line = "nvme 65537 8 MB yes no 162531639296 114505474048 ( 70%) 0 0";
        let pools = parse_mmlspool_output("gpfs1", line);

        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].meta_columns().total_kb(), 0);
    }

    #[test]
    fn garbage() {
        let s = concat!(
            "mmlspool: File system gpfs9 is not known to the GPFS cluster.\n",
            "nvme 65537 8 MB maybe no 1 1 ( 70%) 0 0 (  0%)\n",
            "nvme 65537 8 MB yes no 1 1 70% 0 0 (  0%)\n",
            "nvme 65537 8 MB yes no 99999999999999999999999 1 ( 70%) 0 0\n",
            "\n",
        );

        assert!(parse_mmlspool_output("gpfs9", s).is_empty());
    }

    #[test]
    fn used_percent_of_empty_pool() {
        let size = Size {
            total_kb: 0,
            free_kb: 0,
        };

        assert_eq!(size.used_percent(), 0);
    }
}
