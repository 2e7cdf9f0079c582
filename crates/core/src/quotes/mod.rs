//! Read-only quote dataset, loaded once at startup.
//!
//! The dataset maps a category name either to a flat list of quotes or to an
//! author group (author key -> quotes). Keys are lowercased on load so lookups
//! are case-insensitive.

pub mod format;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::random::IndexSource;

pub use format::{format_author_key, format_author_listing};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum QuoteGroup {
    Quotes(Vec<String>),
    ByAuthor(BTreeMap<String, Vec<String>>),
}

impl QuoteGroup {
    fn quote_count(&self) -> usize {
        match self {
            Self::Quotes(quotes) => quotes.len(),
            Self::ByAuthor(authors) => authors.values().map(Vec::len).sum(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteFormat {
    Json,
    Toml,
}

impl QuoteFormat {
    /// `.toml` files are read as TOML, everything else as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Error)]
pub enum QuoteStoreError {
    #[error("could not read quote file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse quote data: {0}")]
    Parse(String),
    #[error("quote data does not define any categories")]
    Empty,
    #[error("duplicate key `{0}` in quote data (keys are case-insensitive)")]
    DuplicateKey(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuoteStore {
    groups: BTreeMap<String, QuoteGroup>,
}

impl QuoteStore {
    pub fn load(path: &Path) -> Result<Self, QuoteStoreError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| QuoteStoreError::ReadFile { path: path.to_path_buf(), source })?;
        Self::parse(&raw, QuoteFormat::from_path(path))
    }

    pub fn parse(raw: &str, format: QuoteFormat) -> Result<Self, QuoteStoreError> {
        let groups = match format {
            QuoteFormat::Json => serde_json::from_str::<BTreeMap<String, QuoteGroup>>(raw)
                .map_err(|error| QuoteStoreError::Parse(error.to_string()))?,
            QuoteFormat::Toml => toml::from_str::<BTreeMap<String, QuoteGroup>>(raw)
                .map_err(|error| QuoteStoreError::Parse(error.to_string()))?,
        };
        Self::from_groups(groups)
    }

    pub fn from_groups(groups: BTreeMap<String, QuoteGroup>) -> Result<Self, QuoteStoreError> {
        if groups.is_empty() {
            return Err(QuoteStoreError::Empty);
        }

        let mut normalized = BTreeMap::new();
        for (name, group) in groups {
            let group = match group {
                QuoteGroup::Quotes(quotes) => QuoteGroup::Quotes(quotes),
                QuoteGroup::ByAuthor(authors) => QuoteGroup::ByAuthor(lowercase_keys(authors)?),
            };
            insert_unique(&mut normalized, name, group)?;
        }

        Ok(Self { groups: normalized })
    }

    /// Uniformly random quote from a flat category. `None` when the category
    /// is absent, empty, or is an author group.
    pub fn random_from_category(&self, category: &str, rng: &dyn IndexSource) -> Option<&str> {
        match self.groups.get(&category.to_lowercase())? {
            QuoteGroup::Quotes(quotes) => pick(quotes, rng),
            QuoteGroup::ByAuthor(_) => None,
        }
    }

    /// Uniformly random quote by one author of an author group.
    pub fn random_from_author(
        &self,
        group: &str,
        author_key: &str,
        rng: &dyn IndexSource,
    ) -> Option<&str> {
        match self.groups.get(&group.to_lowercase())? {
            QuoteGroup::ByAuthor(authors) => pick(authors.get(&author_key.to_lowercase())?, rng),
            QuoteGroup::Quotes(_) => None,
        }
    }

    /// Author keys available in a group; empty when the group is absent or flat.
    pub fn author_keys(&self, group: &str) -> BTreeSet<&str> {
        match self.groups.get(&group.to_lowercase()) {
            Some(QuoteGroup::ByAuthor(authors)) => authors.keys().map(String::as_str).collect(),
            _ => BTreeSet::new(),
        }
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn total_quotes(&self) -> usize {
        self.groups.values().map(QuoteGroup::quote_count).sum()
    }
}

fn pick<'a>(quotes: &'a [String], rng: &dyn IndexSource) -> Option<&'a str> {
    if quotes.is_empty() {
        return None;
    }
    quotes.get(rng.index(quotes.len())).map(String::as_str)
}

fn lowercase_keys(
    authors: BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, Vec<String>>, QuoteStoreError> {
    let mut normalized = BTreeMap::new();
    for (key, quotes) in authors {
        insert_unique(&mut normalized, key, quotes)?;
    }
    Ok(normalized)
}

fn insert_unique<V>(
    target: &mut BTreeMap<String, V>,
    key: String,
    value: V,
) -> Result<(), QuoteStoreError> {
    let normalized = key.to_lowercase();
    if target.contains_key(&normalized) {
        return Err(QuoteStoreError::DuplicateKey(normalized));
    }
    target.insert(normalized, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{QuoteFormat, QuoteStore, QuoteStoreError};
    use crate::random::{FixedIndex, ThreadRngIndex};

    const SAMPLE_JSON: &str = r#"{
        "random": ["Q1", "Q2", "Q3"],
        "lonely": ["only one"],
        "empty": [],
        "author": {
            "Machado_De_Assis": ["M1"],
            "clarice": ["C1", "C2"],
            "nobody": []
        }
    }"#;

    fn sample_store() -> QuoteStore {
        QuoteStore::parse(SAMPLE_JSON, QuoteFormat::Json).expect("sample data should parse")
    }

    #[test]
    fn single_element_category_always_returns_that_element() {
        let store = sample_store();
        for _ in 0..50 {
            assert_eq!(store.random_from_category("lonely", &ThreadRngIndex), Some("only one"));
        }
    }

    #[test]
    fn empty_or_absent_category_is_not_found() {
        let store = sample_store();
        assert_eq!(store.random_from_category("empty", &ThreadRngIndex), None);
        assert_eq!(store.random_from_category("missing", &ThreadRngIndex), None);
        assert_eq!(store.random_from_category("author", &ThreadRngIndex), None);
    }

    #[test]
    fn category_selection_follows_index_source() {
        let store = sample_store();
        assert_eq!(store.random_from_category("random", &FixedIndex(1)), Some("Q2"));
        assert_eq!(store.random_from_category("RANDOM", &FixedIndex(5)), Some("Q3"));
    }

    #[test]
    fn author_lookup_is_case_insensitive() {
        let store = sample_store();
        assert_eq!(store.random_from_author("author", "machado_de_assis", &FixedIndex(0)), Some("M1"));
        assert_eq!(store.random_from_author("Author", "CLARICE", &FixedIndex(1)), Some("C2"));
    }

    #[test]
    fn author_miss_and_empty_author_are_not_found() {
        let store = sample_store();
        assert_eq!(store.random_from_author("author", "nonexistent", &ThreadRngIndex), None);
        assert_eq!(store.random_from_author("author", "nobody", &ThreadRngIndex), None);
        assert_eq!(store.random_from_author("random", "clarice", &ThreadRngIndex), None);
        assert_eq!(store.random_from_author("missing", "clarice", &ThreadRngIndex), None);
    }

    #[test]
    fn author_keys_lists_normalized_keys_in_order() {
        let store = sample_store();
        let keys = store.author_keys("author").into_iter().collect::<Vec<_>>();
        assert_eq!(keys, vec!["clarice", "machado_de_assis", "nobody"]);
        assert!(store.author_keys("random").is_empty());
        assert!(store.author_keys("missing").is_empty());
    }

    #[test]
    fn reports_categories_and_totals() {
        let store = sample_store();
        let names = store.category_names().collect::<Vec<_>>();
        assert_eq!(names, vec!["author", "empty", "lonely", "random"]);
        assert_eq!(store.total_quotes(), 7);
    }

    #[test]
    fn rejects_malformed_and_empty_data() {
        assert!(matches!(
            QuoteStore::parse(r#"{"random": [1, 2]}"#, QuoteFormat::Json),
            Err(QuoteStoreError::Parse(_))
        ));
        assert!(matches!(
            QuoteStore::parse(r#"["not", "an", "object"]"#, QuoteFormat::Json),
            Err(QuoteStoreError::Parse(_))
        ));
        assert!(matches!(QuoteStore::parse("{}", QuoteFormat::Json), Err(QuoteStoreError::Empty)));
    }

    #[test]
    fn rejects_keys_that_collide_after_lowercasing() {
        let result = QuoteStore::parse(
            r#"{"author": {"Clarice": ["a"], "clarice": ["b"]}}"#,
            QuoteFormat::Json,
        );
        assert!(matches!(result, Err(QuoteStoreError::DuplicateKey(key)) if key == "clarice"));
    }

    #[test]
    fn loads_toml_by_extension() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("quotes.toml");
        fs::write(
            &path,
            r#"
random = ["T1"]

[author]
clarice = ["C1"]
"#,
        )
        .expect("write fixture");

        let store = QuoteStore::load(&path).expect("toml data should load");
        assert_eq!(store.random_from_category("random", &ThreadRngIndex), Some("T1"));
        assert_eq!(store.random_from_author("author", "clarice", &ThreadRngIndex), Some("C1"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = QuoteStore::load(Path::new("/nonexistent/messages.json"));
        assert!(matches!(result, Err(QuoteStoreError::ReadFile { .. })));
    }
}
