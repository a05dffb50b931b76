//! `mmrepquota -Y` parsing.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing::trace;

use crate::table::{Row, Table};

/// The kind of subject a quota applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuotaType {
    /// A user quota, `USR`.
    User,

    /// A group quota, `GRP`.
    Group,

    /// A fileset quota, `FILESET`.
    Fileset,
}

impl QuotaType {
    /// Returns the name used by `mmrepquota`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USR",
            Self::Group => "GRP",
            Self::Fileset => "FILESET",
        }
    }

    /// Returns the label name of the subject id.
    #[must_use]
    pub const fn id_label(self) -> &'static str {
        match self {
            Self::User => "uid",
            Self::Group => "gid",
            Self::Fileset => "fileset_id",
        }
    }
}

impl FromStr for QuotaType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USR" => Ok(Self::User),
            "GRP" => Ok(Self::Group),
            "FILESET" => Ok(Self::Fileset),
            _ => Err(anyhow!("unknown quota type: {s}")),
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage and limits of either blocks or files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    /// Current usage, in kilobytes for blocks.
    pub usage: u64,

    /// Soft limit.
    pub soft_limit: u64,

    /// Hard limit.
    pub hard_limit: u64,

    /// Usage not yet accounted for.
    pub in_doubt: u64,

    /// Grace state as printed, e.g. `none` or `6 days`.
    pub grace: String,
}

/// A user, group or fileset quota entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaRecord {
    fs: String,
    quota_type: QuotaType,
    id: String,
    name: String,
    blocks: Usage,
    files: Usage,
    remarks: String,
    quota: String,
    def_quota: String,
    fid: Option<String>,
    fileset_name: Option<String>,
}

impl QuotaRecord {
    /// Returns the file system name.
    #[must_use]
    pub fn fs(&self) -> &str {
        &self.fs
    }

    /// Returns the quota type.
    #[must_use]
    pub const fn quota_type(&self) -> QuotaType {
        self.quota_type
    }

    /// Returns the uid, gid or fileset id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the user, group or fileset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns block usage and limits in kilobytes.
    #[must_use]
    pub const fn blocks(&self) -> &Usage {
        &self.blocks
    }

    /// Returns file usage and limits.
    #[must_use]
    pub const fn files(&self) -> &Usage {
        &self.files
    }

    /// Returns the remarks, e.g. `i` for implicit entries.
    #[must_use]
    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    /// Returns whether quota enforcement is on.
    #[must_use]
    pub fn quota(&self) -> &str {
        &self.quota
    }

    /// Returns whether default quota is on.
    #[must_use]
    pub fn def_quota(&self) -> &str {
        &self.def_quota
    }

    /// Returns the fileset id this entry is scoped to, if any.
    #[must_use]
    pub fn fid(&self) -> Option<&str> {
        self.fid.as_deref()
    }

    /// Returns the fileset name as printed by `mmrepquota`, if any.
    #[must_use]
    pub fn fileset_name(&self) -> Option<&str> {
        self.fileset_name.as_deref()
    }

    fn from_row(row: &Row) -> Result<Self> {
        let blocks = Usage {
            usage: row.require_u64("blockUsage")?,
            soft_limit: row.require_u64("blockQuota")?,
            hard_limit: row.require_u64("blockLimit")?,
            in_doubt: row.require_u64("blockInDoubt")?,
            grace: row.require("blockGrace")?.into(),
        };

        let files = Usage {
            usage: row.require_u64("filesUsage")?,
            soft_limit: row.require_u64("filesQuota")?,
            hard_limit: row.require_u64("filesLimit")?,
            in_doubt: row.require_u64("filesInDoubt")?,
            grace: row.require("filesGrace")?.into(),
        };

        Ok(Self {
            fs: row.require("filesystemName")?.into(),
            quota_type: row.require("quotaType")?.parse()?,
            id: row.require("id")?.into(),
            name: row.get_or_empty("name").into(),
            blocks,
            files,
            remarks: row.get_or_empty("remarks").into(),
            quota: row.get_or_empty("quota").into(),
            def_quota: row.get_or_empty("defQuota").into(),
            fid: non_empty(row.get("fid")),
            fileset_name: non_empty(row.get("filesetname")),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(Into::into)
}

/// Parses `mmrepquota -Y` output, keeping the output order. Rows with an
/// unknown quota type or missing and non-numeric usage fields are skipped.
#[must_use]
pub fn parse_mmrepquota_output(s: &str) -> Vec<QuotaRecord> {
    Table::parse(s)
        .rows()
        .filter_map(|row| match QuotaRecord::from_row(&row) {
            Ok(quota) => Some(quota),
            Err(error) => {
                trace!(%error, "skipping mmrepquota row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const HEADER: &str = "mmrepquota::HEADER:version:reserved:reserved:filesystemName:quotaType:id:name:blockUsage:blockQuota:blockLimit:blockInDoubt:blockGrace:filesUsage:filesQuota:filesLimit:filesInDoubt:filesGrace:remarks:quota:defQuota:fid:filesetname:\n";

    #[test]
    fn parse() {
        let s = [
            HEADER,
            "mmrepquota::0:1:::gpfs1:USR:0:root:1024:0:0:0:none:5:0:0:0:none:i:on:off:0:root:\n",
            "mmrepquota::0:1:::gpfs1:GRP:1000:staff:2048:4096:8192:16:6 days:10:20:30:1:expired:e:on:on:::\n",
            "mmrepquota::0:1:::gpfs1:FILESET:1:home:524288:0:0:0:none:100:0:0:0:none:i:on:off:::\n",
        ]
        .concat();

        let quotas = parse_mmrepquota_output(&s);
        assert_eq!(quotas.len(), 3);

        assert_eq!(quotas[0].fs(), "gpfs1");
        assert_eq!(quotas[0].quota_type(), QuotaType::User);
        assert_eq!(quotas[0].id(), "0");
        assert_eq!(quotas[0].name(), "root");
        assert_eq!(quotas[0].blocks().usage, 1024);
        assert_eq!(quotas[0].files().usage, 5);
        assert_eq!(quotas[0].remarks(), "i");
        assert_eq!(quotas[0].quota(), "on");
        assert_eq!(quotas[0].def_quota(), "off");
        assert_eq!(quotas[0].fid(), Some("0"));
        assert_eq!(quotas[0].fileset_name(), Some("root"));

        assert_eq!(
            quotas[1].blocks(),
            &Usage {
                usage: 2048,
                soft_limit: 4096,
                hard_limit: 8192,
                in_doubt: 16,
                grace: "6 days".into(),
            }
        );
        assert_eq!(
            quotas[1].files(),
            &Usage {
                usage: 10,
                soft_limit: 20,
                hard_limit: 30,
                in_doubt: 1,
                grace: "expired".into(),
            }
        );
        assert_eq!(quotas[1].fid(), None);
        assert_eq!(quotas[1].fileset_name(), None);

        assert_eq!(quotas[2].quota_type(), QuotaType::Fileset);
        assert_eq!(quotas[2].quota_type().id_label(), "fileset_id");
    }

    #[test]
    fn skipped_rows() {
        let s = [
            HEADER,
            "mmrepquota::0:1:::gpfs1:JOB:7:x:1:0:0:0:none:1:0:0:0:none:i:on:off:::\n",
            "mmrepquota::0:1:::gpfs1:USR:7:x:lots:0:0:0:none:1:0:0:0:none:i:on:off:::\n",
            "mmrepquota::0:1:::gpfs1:USR:7:x:1:0\n",
            "mmrepquota::0:1:::gpfs1:USR:8:y:1:0:0:0:none:1:0:0:0:none:i:on:off\n",
        ]
        .concat();

        let quotas = parse_mmrepquota_output(&s);
        assert_eq!(quotas.len(), 1);
        assert_eq!(quotas[0].id(), "8");
        assert_eq!(quotas[0].fid(), None);
    }

    #[test]
    fn quota_types() {
        for quota_type in [QuotaType::User, QuotaType::Group, QuotaType::Fileset]
        {
            assert_eq!(quota_type.as_str().parse::<QuotaType>().unwrap(), quota_type);
        }

        assert_eq!(QuotaType::User.id_label(), "uid");
        assert_eq!(QuotaType::Group.to_string(), "GRP");
    }
}
