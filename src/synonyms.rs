// 📖 Category Synonyms - Free-text terms → canonical category keys

use crate::query::normalize;
use anyhow::{bail, Result};
use indexmap::IndexMap;

/// Built-in term → category keys.
/// Keys that no catalog uses are harmless: they simply never match.
const BUILTIN_SYNONYMS: &[(&str, &[&str])] = &[
    ("dining", &["dining", "food", "restaurants", "cafes", "fast_food", "f&b"]),
    ("restaurant", &["dining", "restaurants", "food"]),
    ("restaurants", &["dining", "restaurants", "food"]),
    ("cafe", &["dining", "cafes", "food"]),
    ("cafes", &["dining", "cafes", "food"]),
    ("pizza", &["dining", "fast_food", "food"]),
    ("burger", &["dining", "fast_food", "food"]),
    ("coffee", &["dining", "cafes", "food"]),
    ("groceries", &["supermarkets", "grocery", "groceries"]),
    ("supermarket", &["supermarkets", "grocery", "groceries"]),
    ("grocery", &["supermarkets", "grocery", "groceries"]),
    ("petrol", &["petrol", "fuel"]),
    ("fuel", &["petrol", "fuel"]),
    ("gas", &["petrol", "fuel"]),
    ("transport", &["public_transport", "online_transport", "ride_hailing", "transport"]),
    ("taxi", &["ride_hailing", "transport", "online_transport"]),
    ("grab", &["ride_hailing", "online_transport", "transport"]),
    ("gojek", &["ride_hailing", "online_transport", "transport"]),
    ("online", &["online_shopping", "ecommerce", "shopping"]),
    ("ecommerce", &["online_shopping", "ecommerce", "shopping"]),
    ("shopping", &["shopping", "online_shopping", "department_stores"]),
    ("department", &["department_stores", "shopping"]),
    ("electronics", &["electronics", "shopping"]),
    ("telco", &["telco", "utilities"]),
    ("mobile", &["telco", "utilities"]),
    ("broadband", &["telco", "utilities"]),
    ("utilities", &["utilities"]),
    ("electricity", &["utilities"]),
    ("travel", &["travel", "hotels", "airlines"]),
    ("hotel", &["travel", "hotels"]),
    ("airlines", &["travel", "airlines"]),
    ("flights", &["travel", "airlines"]),
    ("entertainment", &["entertainment", "dining"]),
    ("pharmacy", &["pharmacy", "healthcare", "guardian", "watsons"]),
    ("healthcare", &["healthcare", "pharmacy"]),
    ("food", &["dining", "restaurants", "fast_food", "cafes"]),
    ("drinks", &["dining", "cafes", "bars"]),
    ("bars", &["dining", "bars"]),
    ("coffee_tea", &["dining", "cafes"]),
];

/// Normalized term → non-empty, ordered list of category keys
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: IndexMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (term, categories) in BUILTIN_SYNONYMS {
            table.entries.insert(
                (*term).to_string(),
                categories.iter().map(|c| (*c).to_string()).collect(),
            );
        }
        table
    }

    /// Add or replace the entry for `term`. An empty category list is rejected,
    /// since absence already means "no entry".
    pub fn insert<I, S>(&mut self, term: &str, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = normalize(term);
        if key.is_empty() {
            bail!("Synonym term must not be blank");
        }

        let mut list: Vec<String> = Vec::new();
        for category in categories {
            let category = category.into().trim().to_string();
            if !category.is_empty() && !list.contains(&category) {
                list.push(category);
            }
        }

        if list.is_empty() {
            bail!("Synonym '{}' must map to at least one category", key);
        }

        self.entries.insert(key, list);
        Ok(())
    }

    /// Exact lookup on the normalized term
    pub fn lookup(&self, term: &str) -> Option<&[String]> {
        self.entries.get(normalize(term).as_str()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
