// 🗂️ Catalog Index - Flattened view of the catalog
// Built once per catalog load; everything here is a pure function of the catalog

use crate::catalog::{Benefit, Card, Catalog};
use crate::query::{nice_label, normalize};
use crate::synonyms::SynonymTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// A card as shown in card-selection lists
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardRef {
    pub bank: String,
    pub card_name: String,
}

impl CardRef {
    /// "<bank> - <card name>"
    pub fn label(&self) -> String {
        card_label(&self.bank, &self.card_name)
    }
}

pub fn card_label(bank: &str, card_name: &str) -> String {
    format!("{} - {}", bank, card_name)
}

/// One (bank, card, category, benefit) tuple
#[derive(Debug, Clone, Copy)]
pub struct BenefitEntry<'a> {
    pub bank: &'a str,
    pub card: &'a Card,
    pub category: &'a str,
    pub benefit: &'a Benefit,
}

/// Autocomplete entries filed under one category key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionGroup {
    pub category: String,
    pub label: String,

    /// Merchant names, aliases and synonym terms, case-insensitively sorted
    pub items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogIndex {
    catalog: Catalog,
    cards: Vec<CardRef>,
    categories: HashSet<String>,
    suggestions: Vec<String>,
}

impl CatalogIndex {
    pub fn build(catalog: Catalog) -> Self {
        let cards = enumerate_cards(&catalog);
        let categories = canonical_categories(&catalog);
        let suggestions = build_suggestions(&catalog, &categories);

        tracing::info!(
            cards = cards.len(),
            categories = categories.len(),
            suggestions = suggestions.len(),
            "catalog indexed"
        );

        CatalogIndex {
            catalog,
            cards,
            categories,
            suggestions,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// All cards in catalog order
    pub fn cards(&self) -> &[CardRef] {
        &self.cards
    }

    /// Cards ordered by lower-cased "<bank> - <card name>"
    pub fn cards_sorted(&self) -> Vec<CardRef> {
        let mut sorted = self.cards.clone();
        sorted.sort_by_cached_key(|card| card.label().to_lowercase());
        sorted
    }

    pub fn categories(&self) -> &HashSet<String> {
        &self.categories
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Every benefit tuple: bank, then card, then category, in document order
    pub fn entries(&self) -> impl Iterator<Item = BenefitEntry<'_>> {
        self.catalog.banks().flat_map(|(bank, cards)| {
            cards.iter().flat_map(move |card| {
                card.benefits.iter().map(move |(category, benefit)| BenefitEntry {
                    bank,
                    card,
                    category: category.as_str(),
                    benefit,
                })
            })
        })
    }

    /// Suggestions grouped by category.
    ///
    /// Catalog categories come first in document order, followed by categories
    /// only the synonym table names. A synonym term is filed under every
    /// category it expands to.
    pub fn suggestion_groups(&self, synonyms: &SynonymTable) -> Vec<SuggestionGroup> {
        let mut groups: IndexMap<&str, BTreeSet<String>> = IndexMap::new();

        for entry in self.entries() {
            let items = groups.entry(entry.category).or_default();
            for merchant in entry.benefit.merchants() {
                items.extend(
                    merchant
                        .names()
                        .filter(|name| !name.trim().is_empty())
                        .map(str::to_string),
                );
            }
        }

        for (term, categories) in synonyms.iter() {
            for category in categories {
                groups
                    .entry(category.as_str())
                    .or_default()
                    .insert(term.to_string());
            }
        }

        groups
            .into_iter()
            .map(|(category, unique)| {
                let mut items: Vec<String> = unique.into_iter().collect();
                items.sort_by_cached_key(|s| normalize(s));
                SuggestionGroup {
                    category: category.to_string(),
                    label: nice_label(category),
                    items,
                }
            })
            .collect()
    }

    pub fn contains_card(&self, bank: &str, card_name: &str) -> bool {
        self.cards
            .iter()
            .any(|card| card.bank == bank && card.card_name == card_name)
    }
}

fn enumerate_cards(catalog: &Catalog) -> Vec<CardRef> {
    catalog
        .banks()
        .flat_map(|(bank, cards)| {
            cards.iter().map(move |card| CardRef {
                bank: bank.to_string(),
                card_name: card.card_name.clone(),
            })
        })
        .collect()
}

fn canonical_categories(catalog: &Catalog) -> HashSet<String> {
    catalog
        .banks()
        .flat_map(|(_, cards)| cards.iter())
        .flat_map(|card| card.benefits.keys().cloned())
        .collect()
}

/// Category labels plus every merchant name and alias, deduplicated and sorted
fn build_suggestions(catalog: &Catalog, categories: &HashSet<String>) -> Vec<String> {
    let mut unique: BTreeSet<String> = categories.iter().map(|cat| nice_label(cat)).collect();

    for (_, cards) in catalog.banks() {
        for card in cards {
            for benefit in card.benefits.values() {
                for merchant in benefit.merchants() {
                    unique.extend(
                        merchant
                            .names()
                            .filter(|name| !name.trim().is_empty())
                            .map(str::to_string),
                    );
                }
            }
        }
    }

    let mut suggestions: Vec<String> = unique.into_iter().collect();
    // Case-insensitive order; BTreeSet already broke ties on the raw string
    suggestions.sort_by_cached_key(|s| normalize(s));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;

    #[test]
    fn test_cards_in_catalog_order() {
        let index = CatalogIndex::build(sample_catalog());

        let labels: Vec<String> = index.cards().iter().map(CardRef::label).collect();
        assert_eq!(
            labels,
            vec![
                "DBS - Live Fresh",
                "DBS - Altitude",
                "UOB - One",
                "UOB - PRVI Miles",
                "OCBC - 365",
            ]
        );
    }

    #[test]
    fn test_cards_sorted_by_label() {
        let index = CatalogIndex::build(sample_catalog());

        let labels: Vec<String> = index.cards_sorted().iter().map(CardRef::label).collect();
        assert_eq!(labels[0], "DBS - Altitude");
        assert_eq!(labels[1], "DBS - Live Fresh");
        assert_eq!(labels[2], "OCBC - 365");
    }

    #[test]
    fn test_canonical_categories_union() {
        let index = CatalogIndex::build(sample_catalog());
        let categories = index.categories();

        assert_eq!(categories.len(), 6);
        for key in [
            "online_shopping",
            "ride_hailing",
            "travel",
            "dining_restaurants",
            "petrol",
            "supermarkets",
        ] {
            assert!(categories.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_entries_flatten_in_order() {
        let index = CatalogIndex::build(sample_catalog());

        let entries: Vec<(&str, &str, &str)> = index
            .entries()
            .map(|e| (e.bank, e.card.card_name.as_str(), e.category))
            .collect();

        assert_eq!(entries.len(), 9);
        assert_eq!(entries[0], ("DBS", "Live Fresh", "online_shopping"));
        assert_eq!(entries[2], ("DBS", "Altitude", "travel"));
        assert_eq!(entries[8], ("OCBC", "365", "supermarkets"));
    }

    #[test]
    fn test_suggestions_deduplicated_and_sorted() {
        let index = CatalogIndex::build(sample_catalog());
        let suggestions = index.suggestions();

        assert!(suggestions.contains(&"Dining Restaurants".to_string()));
        assert!(suggestions.contains(&"ntuc fairprice".to_string()));
        assert!(suggestions.contains(&"Gojek".to_string()));

        let mut deduped = suggestions.to_vec();
        deduped.dedup();
        assert_eq!(deduped.len(), suggestions.len());

        let lowered: Vec<String> = suggestions.iter().map(|s| s.to_lowercase()).collect();
        let mut sorted = lowered.clone();
        sorted.sort();
        assert_eq!(lowered, sorted);
    }

    #[test]
    fn test_suggestion_groups_merge_merchants_and_synonyms() {
        let index = CatalogIndex::build(sample_catalog());
        let mut synonyms = SynonymTable::new();
        synonyms.insert("taxi", ["ride_hailing"]).unwrap();
        synonyms.insert("hawker", ["dining_restaurants", "food_centres"]).unwrap();

        let groups = index.suggestion_groups(&synonyms);
        let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();

        // Catalog order, then synonym-only categories
        assert_eq!(
            categories,
            vec![
                "online_shopping",
                "ride_hailing",
                "travel",
                "dining_restaurants",
                "petrol",
                "supermarkets",
                "food_centres",
            ]
        );

        let ride = &groups[1];
        assert_eq!(ride.label, "Ride Hailing");
        assert_eq!(ride.items, vec!["go-jek", "Gojek", "taxi"]);

        assert_eq!(groups[2].items, Vec::<String>::new());
        assert_eq!(groups[3].items, vec!["hawker"]);
        assert_eq!(groups[6].items, vec!["hawker"]);
    }

    #[test]
    fn test_builtin_synonym_terms_are_suggested() {
        let index = CatalogIndex::build(sample_catalog());
        let groups = index.suggestion_groups(&SynonymTable::builtin());

        let petrol = groups.iter().find(|g| g.category == "petrol").unwrap();
        assert_eq!(petrol.items, vec!["fuel", "gas", "petrol", "Shell", "SPC"]);

        let airlines = groups.iter().find(|g| g.category == "airlines").unwrap();
        assert!(airlines.items.contains(&"flights".to_string()));
    }

    #[test]
    fn test_empty_catalog_indexes_cleanly() {
        let index = CatalogIndex::build(Catalog::default());

        assert!(index.cards().is_empty());
        assert!(index.categories().is_empty());
        assert_eq!(index.entries().count(), 0);
    }
}
