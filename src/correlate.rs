//! Resolving quota entries to fileset names.

use crate::fileset::Filesets;
use crate::quota::{QuotaRecord, QuotaType};

/// A quota entry with its resolved fileset name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quota {
    record: QuotaRecord,
    fileset: String,
}

impl Quota {
    /// Returns the quota entry.
    #[must_use]
    pub const fn record(&self) -> &QuotaRecord {
        &self.record
    }

    /// Returns the fileset name, empty if unknown.
    #[must_use]
    pub fn fileset(&self) -> &str {
        &self.fileset
    }
}

/// Returns the name of the fileset a quota entry belongs to.
///
/// The fileset id of the entry takes precedence. Fileset quotas without one
/// are looked up by their own id.
#[must_use]
pub fn fileset_name<'a>(
    quota: &QuotaRecord,
    filesets: &'a Filesets,
) -> Option<&'a str> {
    let by_fid = quota
        .fid()
        .and_then(|fid| filesets.get(quota.fs(), fid));

    let fileset = by_fid.or_else(|| {
        if quota.quota_type() == QuotaType::Fileset {
            filesets.get(quota.fs(), quota.id())
        } else {
            None
        }
    })?;

    Some(fileset.name())
}

/// Resolves the fileset names of all quota entries, keeping their order.
#[must_use]
pub fn correlate(quotas: Vec<QuotaRecord>, filesets: &Filesets) -> Vec<Quota> {
    quotas
        .into_iter()
        .map(|record| {
            let fileset =
                fileset_name(&record, filesets).unwrap_or_default().into();

            Quota { record, fileset }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::parse_mmrepquota_output;
    use crate::quota::tests::HEADER;

    const FILESETS: &str = concat!(
        "mmlsfileset::HEADER:version:reserved:reserved:filesystemName:filesetName:id:\n",
        "mmlsfileset::0:1:::gpfs1:root:0:\n",
        "mmlsfileset::0:1:::gpfs1:home:1:\n",
        "mmlsfileset::0:1:::gpfs1:scratch:2:\n",
        "mmlsfileset::0:1:::gpfs2:data:1:\n",
    );

    fn quotas(rows: &[&str]) -> Vec<QuotaRecord> {
        let mut s = HEADER.to_owned();
        for row in rows {
            s.push_str(row);
            s.push('\n');
        }
        parse_mmrepquota_output(&s)
    }

    #[test]
    fn precedence() {
        let filesets = Filesets::parse(FILESETS);

        let quotas = quotas(&[
            // fid wins over the fileset quota's own id
            "mmrepquota::0:1:::gpfs1:FILESET:1:home:0:0:0:0:none:0:0:0:0:none:i:on:off:2::",
            "mmrepquota::0:1:::gpfs1:FILESET:1:home:0:0:0:0:none:0:0:0:0:none:i:on:off:::",
            "mmrepquota::0:1:::gpfs1:USR:1000:alice:0:0:0:0:none:0:0:0:0:none:i:on:off:1:home:",
            // user ids are never fileset ids
            "mmrepquota::0:1:::gpfs1:USR:1:bob:0:0:0:0:none:0:0:0:0:none:i:on:off:::",
            // unknown fid falls back to the fileset id
            "mmrepquota::0:1:::gpfs1:FILESET:2:scratch:0:0:0:0:none:0:0:0:0:none:i:on:off:7::",
            "mmrepquota::0:1:::gpfs2:FILESET:1:data:0:0:0:0:none:0:0:0:0:none:i:on:off:::",
            "mmrepquota::0:1:::gpfs3:FILESET:1:x:0:0:0:0:none:0:0:0:0:none:i:on:off:1::",
        ]);

        let resolved = correlate(quotas, &filesets);
        let names = resolved.iter().map(Quota::fileset).collect::<Vec<_>>();

        assert_eq!(
            names,
            vec!["scratch", "home", "home", "", "scratch", "data", ""]
        );

        assert_eq!(resolved[2].record().name(), "alice");
    }

    #[test]
    fn no_filesets() {
        let quotas = quotas(&[
            "mmrepquota::0:1:::gpfs1:FILESET:1:home:0:0:0:0:none:0:0:0:0:none:i:on:off:1::",
            "mmrepquota::0:1:::gpfs1:GRP:100:users:0:0:0:0:none:0:0:0:0:none:i:on:off:::",
        ]);

        let resolved = correlate(quotas, &Filesets::default());

        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|quota| quota.fileset().is_empty()));
    }
}
