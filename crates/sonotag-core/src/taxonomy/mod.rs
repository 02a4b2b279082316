//! Taxonomy loading: the fixed label set audio clips are ranked against.
//!
//! A taxonomy file holds one label per line:
//!
//! ```text
//! soundFxTaxonomy__Ambient Environment__Coliseum Ambient: distant crowd, stone reverb
//! ```
//!
//! Everything before the first colon is a `__`-separated path whose last
//! segment becomes the label key; everything after it is the description the
//! text encoder embeds.

mod builtin;

pub use builtin::BUILTIN_LABELS;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TaxonomyError;

/// Separator between taxonomy path segments.
const SEGMENT_DELIMITER: &str = "__";

/// A single taxonomy label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    /// Normalized key (lowercase, whitespace and `/` replaced by `_`)
    pub key: String,
    /// Free-text description used as the semantic anchor
    pub description: String,
}

impl LabelEntry {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }
}

/// An ordered, key-unique set of labels.
///
/// Iteration order is the order in which keys first appeared. Re-inserting an
/// existing key replaces its description in place.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyStore {
    entries: Vec<LabelEntry>,
    by_key: HashMap<String, usize>,
}

impl TaxonomyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a taxonomy file.
    ///
    /// Fails if the file is missing or unreadable. A readable file with no
    /// valid lines yields an empty store; see [`TaxonomyStore::resolve`] for
    /// the fallback policy.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        if !path.exists() {
            return Err(TaxonomyError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::parse(&content);
        tracing::debug!("Loaded {} labels from {:?}", store.len(), path);
        Ok(store)
    }

    /// Parse taxonomy text. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut store = Self::new();
        for line in content.lines() {
            if let Some(entry) = parse_line(line) {
                store.insert(entry);
            }
        }
        store
    }

    /// The built-in taxonomy.
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_LABELS
                .iter()
                .map(|(key, description)| LabelEntry::new(*key, *description)),
        )
    }

    /// Build a store from entries, last write wins on duplicate keys.
    pub fn from_entries(entries: impl IntoIterator<Item = LabelEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.insert(entry);
        }
        store
    }

    /// Load `source` if present and non-empty, otherwise return `fallback`.
    ///
    /// A missing file (or no source at all) and a file without any valid
    /// label lines both fall back. A file that exists but cannot be read is
    /// an error.
    pub fn resolve(source: Option<&Path>, fallback: TaxonomyStore) -> Result<Self, TaxonomyError> {
        let Some(path) = source else {
            tracing::info!("No taxonomy file configured, using built-in labels");
            return Ok(fallback);
        };

        match Self::load(path) {
            Ok(store) if !store.is_empty() => {
                tracing::info!("Loaded {} labels from {:?}", store.len(), path);
                Ok(store)
            }
            Ok(_) => {
                tracing::warn!(
                    "Taxonomy {:?} has no valid labels, using built-in labels",
                    path
                );
                Ok(fallback)
            }
            Err(TaxonomyError::NotFound(_)) => {
                tracing::warn!("Taxonomy {:?} not found, using built-in labels", path);
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }

    /// Insert an entry. Returns the replaced entry if the key already existed.
    pub fn insert(&mut self, entry: LabelEntry) -> Option<LabelEntry> {
        if let Some(&idx) = self.by_key.get(&entry.key) {
            tracing::debug!("Duplicate taxonomy key {:?}, keeping last", entry.key);
            return Some(std::mem::replace(&mut self.entries[idx], entry));
        }
        self.by_key.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        None
    }

    /// Look up a label by key.
    pub fn get(&self, key: &str) -> Option<&LabelEntry> {
        self.by_key.get(key).map(|&idx| &self.entries[idx])
    }

    /// All entries in taxonomy order.
    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    /// Keys in taxonomy order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    /// Descriptions in taxonomy order.
    pub fn descriptions(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.description.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse one taxonomy line into an entry.
///
/// Returns `None` for blank lines, lines without a colon, and lines whose
/// key normalizes to an empty string.
pub fn parse_line(line: &str) -> Option<LabelEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (taxonomy_path, description) = line.split_once(':')?;
    let last_segment = taxonomy_path
        .split(SEGMENT_DELIMITER)
        .last()
        .unwrap_or(taxonomy_path);
    let key = normalize_key(last_segment);
    if key.is_empty() {
        return None;
    }
    Some(LabelEntry::new(key, description.trim()))
}

/// Normalize a taxonomy segment into a label key.
///
/// Trims, lowercases, and replaces each whitespace character and `/` with `_`.
pub fn normalize_key(segment: &str) -> String {
    segment
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_key_shaped(key: &str) -> bool {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Coliseum Ambient"), "coliseum_ambient");
        assert_eq!(normalize_key("  Wind/Rain Mix "), "wind_rain_mix");
        assert_eq!(normalize_key("UI\tError"), "ui_error");
        assert_eq!(normalize_key("already_ok"), "already_ok");
    }

    #[test]
    fn test_parse_line_takes_last_segment() {
        let entry =
            parse_line("soundFxTaxonomy__Ambient Environment__Coliseum Ambient: crowd, stone reverb")
                .unwrap();
        assert_eq!(entry.key, "coliseum_ambient");
        assert_eq!(entry.description, "crowd, stone reverb");
    }

    #[test]
    fn test_parse_line_splits_on_first_colon() {
        let entry = parse_line("fx__Bells: church bells: distant, 3 strikes").unwrap();
        assert_eq!(entry.key, "bells");
        assert_eq!(entry.description, "church bells: distant, 3 strikes");
    }

    #[test]
    fn test_parse_line_without_delimiter_uses_whole_path() {
        let entry = parse_line("Rain: steady rain on a roof").unwrap();
        assert_eq!(entry.key, "rain");
    }

    #[test]
    fn test_parse_line_skips_malformed() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("Header Without Colon").is_none());
        assert!(parse_line("fx__  : empty key").is_none());
    }

    #[test]
    fn test_parse_skips_blank_and_colonless_lines() {
        let store = TaxonomyStore::parse(
            "# Sound FX Taxonomy\n\
             \n\
             fx__Impacts__Metal Hit: clang\n\
             Impacts section\n\
             fx__Impacts__Wood Hit: knock\n",
        );
        assert_eq!(store.keys(), vec!["metal_hit", "wood_hit"]);
    }

    #[test]
    fn test_duplicate_key_last_write_wins_in_first_position() {
        let store = TaxonomyStore::parse(
            "a__Dog: first dog\n\
             a__Cat: cat\n\
             b__Dog: second dog\n",
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store.keys(), vec!["dog", "cat"]);
        assert_eq!(store.get("dog").unwrap().description, "second dog");
    }

    #[test]
    fn test_insert_returns_replaced_entry() {
        let mut store = TaxonomyStore::new();
        assert!(store.insert(LabelEntry::new("a", "one")).is_none());
        let replaced = store.insert(LabelEntry::new("a", "two")).unwrap();
        assert_eq!(replaced.description, "one");
        assert_eq!(store.get("a").unwrap().description, "two");
    }

    #[test]
    fn test_parsed_keys_are_normalized_and_unique() {
        let content = "x__Heavy Door Slam: door\n\
                       x__Door/Creak: creak\n\
                       y__HEAVY DOOR SLAM: louder door\n\
                       z__Footsteps 2: steps\n\
                       no colon here\n";
        let store = TaxonomyStore::parse(content);
        let keys = store.keys();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        assert!(keys.iter().all(|k| is_key_shaped(k)), "keys: {keys:?}");
    }

    #[test]
    fn test_builtin_is_well_formed() {
        let store = TaxonomyStore::builtin();
        assert_eq!(store.len(), BUILTIN_LABELS.len());
        assert!(store.entries().iter().all(|e| is_key_shaped(&e.key)));
        assert!(store.entries().iter().all(|e| !e.description.is_empty()));
        assert_eq!(store.entries()[0].key, "melee_sword_slash_light");
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = TaxonomyStore::load(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, TaxonomyError::NotFound(_)));
    }

    #[test]
    fn test_load_directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TaxonomyStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, TaxonomyError::Read { .. }));
    }

    #[test]
    fn test_resolve_uses_file_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "fx__Applause: clapping crowd\n").unwrap();

        let store = TaxonomyStore::resolve(Some(&path), TaxonomyStore::builtin()).unwrap();
        assert_eq!(store.keys(), vec!["applause"]);
    }

    #[test]
    fn test_resolve_falls_back_when_missing_or_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "only a header line\n\n").unwrap();

        let fallback = TaxonomyStore::from_entries([LabelEntry::new("fallback", "default")]);

        let store = TaxonomyStore::resolve(Some(&missing), fallback.clone()).unwrap();
        assert_eq!(store.keys(), vec!["fallback"]);

        let store = TaxonomyStore::resolve(Some(&empty), fallback.clone()).unwrap();
        assert_eq!(store.keys(), vec!["fallback"]);

        let store = TaxonomyStore::resolve(None, fallback).unwrap();
        assert_eq!(store.keys(), vec!["fallback"]);
    }

    #[test]
    fn test_resolve_propagates_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = TaxonomyStore::resolve(Some(dir.path()), TaxonomyStore::builtin());
        assert!(matches!(result, Err(TaxonomyError::Read { .. })));
    }
}
