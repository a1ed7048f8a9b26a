//! The accumulated catalog of enriched repositories.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One enriched repository record.
///
/// External identity (`id`, `name`, `url`) is immutable; the derived fields
/// are frozen at `date_fetched` and never updated once the entry is in the
/// catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub stars: u64,
    pub language: Option<String>,
    /// 1 to 3 normalized keywords.
    pub keywords: Vec<String>,
    /// Open issues created within the trailing window.
    pub new_open_issues: u64,
    /// Stars gained within the trailing window.
    pub new_stars: u64,
    pub contributors: u64,
    /// Counted source lines, when the optional line-count step ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_lines: Option<u64>,
    /// Ratio of recent open issues to recent new stars (raw issue count
    /// when no stars were gained).
    pub demand_index: f64,
    pub last_updated_repo: Option<DateTime<Utc>>,
    pub last_pushed_repo: Option<DateTime<Utc>>,
    pub date_fetched: DateTime<Utc>,
}

/// Mapping from repository id to its catalog entry.
///
/// Grows without bound across runs; an id already present is never updated.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: BTreeMap<u64, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Insert an entry, unless its id is already known.
    ///
    /// Returns whether the entry was inserted.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if self.entries.contains_key(&entry.id) {
            return false;
        }
        self.entries.insert(entry.id, entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Entries ordered by demand index descending, id ascending on ties.
    ///
    /// This is the persisted output ordering.
    pub fn sorted_by_demand(&self) -> Vec<&CatalogEntry> {
        let mut ordered: Vec<&CatalogEntry> = self.entries.values().collect();
        ordered.sort_by(|a, b| {
            b.demand_index
                .partial_cmp(&a.demand_index)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        ordered
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

#[cfg(test)]
pub(crate) fn entry_fixture(id: u64, demand_index: f64) -> CatalogEntry {
    CatalogEntry {
        id,
        name: format!("owner/repo-{id}"),
        url: format!("https://github.com/owner/repo-{id}"),
        stars: 10,
        language: Some("Rust".to_string()),
        keywords: vec!["Tool".to_string()],
        new_open_issues: 1,
        new_stars: 2,
        contributors: 3,
        code_lines: None,
        demand_index,
        last_updated_repo: None,
        last_pushed_repo: None,
        date_fetched: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_a_noop_for_a_known_id() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(entry_fixture(1, 0.5)));

        let mut replacement = entry_fixture(1, 9.0);
        replacement.name = "other/name".to_string();
        assert!(!catalog.insert(replacement));

        assert_eq!(catalog.len(), 1);
        let kept = catalog.entries().next().unwrap();
        assert_eq!(kept.name, "owner/repo-1");
        assert_eq!(kept.demand_index, 0.5);
    }

    #[test]
    fn demand_ordering_is_descending_with_id_tiebreak() {
        let catalog: Catalog = [
            entry_fixture(3, 1.0),
            entry_fixture(1, 4.0),
            entry_fixture(2, 1.0),
        ]
        .into_iter()
        .collect();

        let ids: Vec<u64> = catalog.sorted_by_demand().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
