use crate::builder::BuildStats;
use crate::patch::PatchStats;
use std::fmt;

/// Diagnostics for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: String,
    /// Records offered by the source.
    pub source: usize,
    pub build: BuildStats,
    pub patch: PatchStats,
}

/// Ordered per-collection log of a clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneReport {
    collections: Vec<CollectionReport>,
    /// Upload files written under new keys.
    pub blobs_copied: usize,
}

impl CloneReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_build(&mut self, collection: &str, source: usize, build: BuildStats) {
        let entry = self.entry_mut(collection);
        entry.source = source;
        entry.build = build;
    }

    pub fn record_patch(&mut self, collection: &str, patch: PatchStats) {
        self.entry_mut(collection).patch = patch;
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.collection == collection)
    }

    /// Entries in build order.
    pub fn collections(&self) -> &[CollectionReport] {
        &self.collections
    }

    pub fn total_created(&self) -> usize {
        self.collections.iter().map(|c| c.build.created).sum()
    }

    pub fn total_orphaned(&self) -> usize {
        self.collections.iter().map(|c| c.build.orphaned).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections.iter().map(|c| c.build.skipped).sum()
    }

    pub fn total_dangling(&self) -> usize {
        self.collections.iter().map(|c| c.patch.dangling).sum()
    }

    fn entry_mut(&mut self, collection: &str) -> &mut CollectionReport {
        let pos = match self.collections.iter().position(|c| c.collection == collection) {
            Some(pos) => pos,
            None => {
                self.collections.push(CollectionReport {
                    collection: collection.to_string(),
                    ..CollectionReport::default()
                });
                self.collections.len() - 1
            }
        };
        &mut self.collections[pos]
    }
}

impl fmt::Display for CloneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<28} {:>7} {:>7} {:>8} {:>6} {:>7} {:>7} {:>8}",
            "collection", "source", "created", "orphaned", "cyclic", "skipped", "patched", "dangling"
        )?;
        for c in &self.collections {
            writeln!(
                f,
                "{:<28} {:>7} {:>7} {:>8} {:>6} {:>7} {:>7} {:>8}",
                c.collection,
                c.source,
                c.build.created,
                c.build.orphaned,
                c.build.cyclic,
                c.build.skipped,
                c.patch.patched,
                c.patch.dangling
            )?;
        }
        write!(
            f,
            "{} created, {} orphaned, {} skipped, {} dangling references, {} files copied",
            self.total_created(),
            self.total_orphaned(),
            self.total_skipped(),
            self.total_dangling(),
            self.blobs_copied
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_first_seen_order() {
        let mut report = CloneReport::new();
        report.record_build(
            "pages",
            3,
            BuildStats {
                created: 2,
                orphaned: 1,
                ..BuildStats::default()
            },
        );
        report.record_build("page_entries", 0, BuildStats::default());
        report.record_patch(
            "pages",
            PatchStats {
                dangling: 2,
                ..PatchStats::default()
            },
        );

        let names: Vec<_> = report.collections().iter().map(|c| c.collection.as_str()).collect();
        assert_eq!(names, vec!["pages", "page_entries"]);
        assert_eq!(report.get("pages").map(|c| c.source), Some(3));
        assert_eq!(report.total_created(), 2);
        assert_eq!(report.total_orphaned(), 1);
        assert_eq!(report.total_dangling(), 2);
        assert!(report.to_string().contains("2 created, 1 orphaned"));
    }
}
