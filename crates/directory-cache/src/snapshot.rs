//! Immutable directory snapshots.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Which directory a reference is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryKind {
    Conversations,
    Users,
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversations => f.write_str("conversations"),
            Self::Users => f.write_str("users"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    PublicChannel,
    PrivateChannel,
    Im,
    Mpim,
    User,
}

/// One resolvable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Stable Slack ID (`C…`, `G…`, `D…`, `U…`).
    pub id: String,
    /// Human form: `#name`, `@username` or `@mpdm-…`.
    pub reference: String,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn new(id: impl Into<String>, reference: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            id: id.into(),
            reference: reference.into(),
            kind,
        }
    }
}

/// Ordered entries plus the reverse indexes derived from them.
///
/// Only constructed through [`DirectorySnapshot::from_entries`], so the
/// indexes always agree with `entries`.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    entries: Vec<DirectoryEntry>,
    by_reference: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    generation: u64,
}

impl DirectorySnapshot {
    /// A never-loaded snapshot (generation 0).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot. Repeated IDs keep their first occurrence, as do
    /// repeated references.
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>, generation: u64) -> Self {
        let mut snapshot = Self {
            generation,
            ..Self::default()
        };

        for entry in entries {
            if snapshot.by_id.contains_key(&entry.id) {
                continue;
            }
            let index = snapshot.entries.len();
            snapshot.by_id.insert(entry.id.clone(), index);
            snapshot
                .by_reference
                .entry(entry.reference.clone())
                .or_insert(index);
            snapshot.entries.push(entry);
        }

        snapshot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&DirectoryEntry> {
        self.by_id.get(id).map(|index| &self.entries[*index])
    }

    pub fn get_by_reference(&self, reference: &str) -> Option<&DirectoryEntry> {
        self.by_reference
            .get(reference)
            .map(|index| &self.entries[*index])
    }

    /// `#`/`@` references are reverse-looked-up; anything else is treated as
    /// an ID and must be present.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        let entry = if reference.starts_with('#') || reference.starts_with('@') {
            self.get_by_reference(reference)
        } else {
            self.get_by_id(reference)
        };
        entry.map(|entry| entry.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DirectorySnapshot {
        DirectorySnapshot::from_entries(
            vec![
                DirectoryEntry::new("C1", "#general", EntryKind::PublicChannel),
                DirectoryEntry::new("G1", "#secret", EntryKind::PrivateChannel),
                DirectoryEntry::new("D1", "@alice", EntryKind::Im),
                DirectoryEntry::new("C1", "#general-dupe", EntryKind::PublicChannel),
            ],
            3,
        )
    }

    #[test]
    fn indexes_agree_with_entries() {
        let snapshot = sample();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.generation(), 3);
        for (index, entry) in snapshot.entries().iter().enumerate() {
            assert_eq!(snapshot.get_by_id(&entry.id), Some(&snapshot.entries()[index]));
            assert_eq!(snapshot.get_by_reference(&entry.reference).map(|e| &e.id), Some(&entry.id));
        }
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let snapshot = sample();
        assert_eq!(snapshot.resolve("#general"), Some("C1"));
        assert_eq!(snapshot.resolve("#general-dupe"), None);
    }

    #[test]
    fn resolve_prefixed_and_bare() {
        let snapshot = sample();
        assert_eq!(snapshot.resolve("@alice"), Some("D1"));
        assert_eq!(snapshot.resolve("G1"), Some("G1"));
        assert_eq!(snapshot.resolve("C404"), None);
        assert_eq!(snapshot.resolve("#nope"), None);
    }

    #[test]
    fn empty_is_not_loaded() {
        let snapshot = DirectorySnapshot::empty();
        assert!(!snapshot.is_loaded());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.resolve("C1"), None);
    }
}
