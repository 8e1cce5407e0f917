//! Title → quirk-group registry.
//!
//! # Lookup model
//! The registry is built once from a declarative table of
//! `(group name, titles)` pairs and inverted into a `TitleId → group names`
//! map, so a lookup is one hash access regardless of how many groups exist.
//!
//! A title may sit in several groups.  Every membership is kept; the registry
//! never picks a winner.
//!
//! # Failure model
//! Table problems (empty group, malformed id, duplicate group name) surface
//! once, at construction, as [`RegistryError`].  Lookups never fail: any
//! string is accepted and an unknown or malformed id simply matches nothing.

pub mod table;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use thiserror::Error;

use crate::title::{TitleId, TitleIdError};
pub use table::{QuirkTable, BUILTIN_QUIRKS};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Quirk group '{0}' has no titles")]
    EmptyGroup(String),
    #[error("Quirk group '{0}' is defined more than once")]
    DuplicateGroup(String),
    #[error("Quirk group '{group}' lists a bad title id: {source}")]
    BadTitle {
        group: String,
        #[source]
        source: TitleIdError,
    },
    #[error("Quirk table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ── QuirkGroup ───────────────────────────────────────────────────────────────

/// A named set of titles that share one handling deviation.
#[derive(Debug, Clone)]
pub struct QuirkGroup {
    pub name:   String,
    pub titles: BTreeSet<TitleId>,
}

impl QuirkGroup {
    pub fn contains(&self, title_id: &str) -> bool {
        self.titles.contains(title_id)
    }
}

// ── TitlePolicyRegistry ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TitlePolicyRegistry {
    groups: Vec<QuirkGroup>,
    index:  HashMap<TitleId, BTreeSet<String>>,
}

impl TitlePolicyRegistry {
    /// Registry over [`BUILTIN_QUIRKS`].
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_table(BUILTIN_QUIRKS.iter().map(|(name, titles)| (*name, titles.iter().copied())))
    }

    /// Build from `(group name, titles)` pairs, validating every entry.
    pub fn from_table<'a, G, T>(table: G) -> Result<Self, RegistryError>
    where
        G: IntoIterator<Item = (&'a str, T)>,
        T: IntoIterator<Item = &'a str>,
    {
        let mut groups: Vec<QuirkGroup> = Vec::new();
        let mut index: HashMap<TitleId, BTreeSet<String>> = HashMap::new();

        for (name, raw_titles) in table {
            if groups.iter().any(|g| g.name == name) {
                return Err(RegistryError::DuplicateGroup(name.to_owned()));
            }
            let titles = raw_titles
                .into_iter()
                .map(|t| TitleId::parse(t).map_err(|source| RegistryError::BadTitle {
                    group: name.to_owned(),
                    source,
                }))
                .collect::<Result<BTreeSet<_>, _>>()?;
            if titles.is_empty() {
                return Err(RegistryError::EmptyGroup(name.to_owned()));
            }
            for title in &titles {
                index.entry(title.clone()).or_default().insert(name.to_owned());
            }
            groups.push(QuirkGroup { name: name.to_owned(), titles });
        }

        tracing::debug!(groups = groups.len(), titles = index.len(), "quirk registry built");
        Ok(Self { groups, index })
    }

    /// Build from a JSON object of `{"group": ["CUSA00000", ...]}`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: JsonTable = serde_json::from_str(json)?;
        Self::from_table(raw.0.iter().map(|(name, titles)| (name.as_str(), titles.iter().map(String::as_str))))
    }

    /// Names of every group `title_id` belongs to.  Empty when the id is
    /// unknown or malformed.
    pub fn groups_for(&self, title_id: &str) -> BTreeSet<&str> {
        self.index
            .get(title_id)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains_title(&self, title_id: &str) -> bool {
        self.index.contains_key(title_id)
    }

    pub fn group(&self, name: &str) -> Option<&QuirkGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Groups in table order.
    pub fn groups(&self) -> &[QuirkGroup] { &self.groups }

    pub fn title_count(&self) -> usize { self.index.len() }
}

// ── JSON table ───────────────────────────────────────────────────────────────

/// Group entries in document order.  Repeated keys are kept so that
/// [`TitlePolicyRegistry::from_table`] can reject them.
struct JsonTable(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for JsonTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = JsonTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of group name to title id list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<JsonTable, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
                    entries.push(entry);
                }
                Ok(JsonTable(entries))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
