//! Versioned cache partition naming.
//!
//! Every partition name embeds the deployment's version token:
//! `{prefix}-{version}-{suffix}`. Bumping the token and activating is the
//! sole cache-invalidation mechanism: activation deletes every partition
//! whose name is not one of the four current-version names.

/// The four logical partitions of the offline cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// App shell resources fetched at install time.
    Precache,
    /// Scripts, styles, and opportunistically cached navigations.
    Runtime,
    /// Images, bounded by entry count and optionally by age.
    Images,
    /// JSON API responses.
    Data,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 4] = [
        PartitionKind::Precache,
        PartitionKind::Runtime,
        PartitionKind::Images,
        PartitionKind::Data,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            PartitionKind::Precache => "precache",
            PartitionKind::Runtime => "runtime",
            PartitionKind::Images => "images",
            PartitionKind::Data => "data",
        }
    }
}

/// The set of partition names for one deployment version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    prefix: String,
    version: String,
}

impl PartitionSet {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), version: version.into() }
    }

    /// The version token embedded in every partition name.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full partition name for a logical partition.
    pub fn name(&self, kind: PartitionKind) -> String {
        format!("{}-{}-{}", self.prefix, self.version, kind.suffix())
    }

    /// All four current-version partition names.
    pub fn current(&self) -> [String; 4] {
        PartitionKind::ALL.map(|kind| self.name(kind))
    }

    /// Whether a stored partition name belongs to this version.
    ///
    /// Anything that doesn't match is garbage-collected at activation,
    /// including partitions created by unrelated prefixes.
    pub fn is_current(&self, name: &str) -> bool {
        PartitionKind::ALL.iter().any(|kind| self.name(*kind) == name)
    }
}
