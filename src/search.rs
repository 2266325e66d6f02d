// 🔍 Search Engine - Catalog index + synonyms → ranked card benefits
//
// One call runs the whole pipeline: expand → match → score → rank.
// The engine is immutable during a query; reloading swaps in a fresh index.

use crate::catalog::Catalog;
use crate::indexer::{CardRef, CatalogIndex, SuggestionGroup};
use crate::matcher::{match_entry, MatchResult};
use crate::query::{expand_query, normalize, ExpandedQuery};
use crate::ranking::{group_by_card, rank, CardGroup, RESULT_LIMIT};
use crate::saved::SavedCards;
use crate::synonyms::SynonymTable;

/// Default cap on autocomplete suggestions
pub const SUGGESTION_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct SearchEngine {
    index: CatalogIndex,
    synonyms: SynonymTable,
    limit: usize,
}

impl SearchEngine {
    pub fn new(catalog: Catalog, synonyms: SynonymTable) -> Self {
        SearchEngine {
            index: CatalogIndex::build(catalog),
            synonyms,
            limit: RESULT_LIMIT,
        }
    }

    /// Override the number of rows returned per query (minimum 1)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn expand(&self, query: &str) -> ExpandedQuery {
        expand_query(query, self.index.categories(), &self.synonyms)
    }

    /// Ranked benefits for `query`.
    ///
    /// `None` for a blank query (nothing to do), `Some(vec![])` when nothing matched.
    pub fn search(&self, query: &str, saved: &SavedCards) -> Option<Vec<MatchResult>> {
        if query.trim().is_empty() {
            return None;
        }

        let expanded = self.expand(query);
        let candidates: Vec<MatchResult> = self
            .index
            .entries()
            .filter_map(|entry| match_entry(&entry, &expanded, saved))
            .collect();

        tracing::debug!(
            query = %expanded.normalized,
            candidates = candidates.len(),
            "benefits matched"
        );

        Some(rank(candidates, self.limit))
    }

    /// Same ranking, merged into one row per card
    pub fn search_grouped(&self, query: &str, saved: &SavedCards) -> Option<Vec<CardGroup>> {
        self.search(query, saved).map(|rows| group_by_card(&rows))
    }

    pub fn cards(&self) -> &[CardRef] {
        self.index.cards()
    }

    pub fn cards_sorted(&self) -> Vec<CardRef> {
        self.index.cards_sorted()
    }

    pub fn suggestions(&self) -> &[String] {
        self.index.suggestions()
    }

    /// Suggestions containing `text` (case-insensitive); all of them for blank text
    pub fn suggestions_matching(&self, text: &str, limit: usize) -> Vec<&str> {
        let needle = normalize(text);
        self.index
            .suggestions()
            .iter()
            .filter(|s| needle.is_empty() || s.to_lowercase().contains(&needle))
            .take(limit)
            .map(String::as_str)
            .collect()
    }

    /// Category-grouped suggestions whose items contain `text`.
    ///
    /// Groups left without items are dropped; `limit` caps the items across all groups.
    pub fn suggestion_groups(&self, text: &str, limit: usize) -> Vec<SuggestionGroup> {
        let needle = normalize(text);
        let mut remaining = limit;
        let mut groups = Vec::new();

        for mut group in self.index.suggestion_groups(&self.synonyms) {
            if remaining == 0 {
                break;
            }
            group
                .items
                .retain(|item| needle.is_empty() || item.to_lowercase().contains(&needle));
            group.items.truncate(remaining);
            if group.items.is_empty() {
                continue;
            }
            remaining -= group.items.len();
            groups.push(group);
        }

        groups
    }

    /// Rebuild the index from a reloaded catalog.
    ///
    /// Returns false (and keeps the current index) when the content is unchanged.
    pub fn reload(&mut self, catalog: Catalog) -> bool {
        if catalog.fingerprint() == self.index.catalog().fingerprint() {
            tracing::debug!("catalog unchanged; keeping index");
            return false;
        }

        tracing::info!(fingerprint = %catalog.fingerprint(), "catalog reloaded");
        self.index = CatalogIndex::build(catalog);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{sample_catalog, sample_catalog_json};
    use serde_json::json;

    fn engine() -> SearchEngine {
        SearchEngine::new(sample_catalog(), SynonymTable::builtin())
    }

    #[test]
    fn test_blank_query_is_noop() {
        let engine = engine();
        assert!(engine.search("", &SavedCards::new()).is_none());
        assert!(engine.search("   \t", &SavedCards::new()).is_none());
    }

    #[test]
    fn test_no_match_is_explicit_empty() {
        let results = engine().search("spaceship", &SavedCards::new());
        assert_eq!(results, Some(Vec::new()));
    }

    #[test]
    fn test_alias_query_finds_benefit() {
        for alias in ["shopee sg", "SHOPEE SG", "Shopee", "go-jek", "ntuc fairprice"] {
            let results = engine().search(alias, &SavedCards::new()).unwrap();
            assert!(
                results.iter().any(|r| r.matched_merchant.is_some()),
                "no merchant hit for {}",
                alias
            );
        }
    }

    #[test]
    fn test_dining_ranking_by_score() {
        let results = engine().search("Dining & Restaurants", &SavedCards::new()).unwrap();

        let cards: Vec<&str> = results.iter().map(|r| r.card.as_str()).collect();
        // 10% (80) > 6% (48) > 1.2 mpd (14.4)
        assert_eq!(cards, vec!["UOB - One", "OCBC - 365", "DBS - Altitude"]);
    }

    #[test]
    fn test_saved_cards_lead_and_partitions_sorted() {
        let mut saved = SavedCards::new();
        saved.add("DBS", "Altitude");

        let results = engine().search("dining", &saved).unwrap();

        assert!(results[0].saved);
        assert_eq!(results[0].card, "DBS - Altitude");

        let first_unsaved = results.iter().position(|r| !r.saved).unwrap();
        assert!(results[first_unsaved..].iter().all(|r| !r.saved));
        for part in [&results[..first_unsaved], &results[first_unsaved..]] {
            assert!(part.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_results_never_exceed_limit() {
        // "a" substring-matches nearly every category key
        let results = engine().search("a", &SavedCards::new()).unwrap();
        assert!(results.len() <= RESULT_LIMIT);

        let narrow = engine().with_limit(2).search("a", &SavedCards::new()).unwrap();
        assert_eq!(narrow.len(), 2);
    }

    #[test]
    fn test_grab_matches_ride_hailing() {
        let results = engine().search("grab", &SavedCards::new()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].card, "UOB - PRVI Miles");
        assert!(results.iter().all(|r| r.category == "ride_hailing"));
    }

    #[test]
    fn test_search_is_idempotent() {
        let engine = engine();
        let mut saved = SavedCards::new();
        saved.add("OCBC", "365");

        let first = engine.search("restaurants", &saved);
        let second = engine.search("restaurants", &saved);
        assert_eq!(first, second);
    }

    #[test]
    fn test_grouped_search() {
        let engine = SearchEngine::new(
            Catalog::from_value(json!({
                "UOB": [{
                    "card_name": "One",
                    "benefits": {
                        "dining": { "description": "5% on dining" },
                        "fast_food": { "description": "8% at fast food outlets" }
                    }
                }]
            }))
            .unwrap(),
            SynonymTable::builtin(),
        );

        let groups = engine.search_grouped("food", &SavedCards::new()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].benefits.len(), 2);
        assert_eq!(groups[0].best_benefit().unwrap().category, "fast_food");
    }

    #[test]
    fn test_suggestions_matching() {
        let engine = engine();

        let hits = engine.suggestions_matching("fair", 10);
        assert_eq!(hits, vec!["FairPrice", "ntuc fairprice"]);
        assert_eq!(engine.suggestions_matching("", 3).len(), 3);
    }

    #[test]
    fn test_suggestion_groups_surface_synonym_terms() {
        let engine = engine();

        let taxi = engine.suggestion_groups("tax", 50);
        let categories: Vec<&str> = taxi.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["ride_hailing", "online_transport", "transport"]);
        assert!(taxi.iter().all(|g| g.items == vec!["taxi"]));

        // Terms reached through the group are real queries
        let results = engine.search(&taxi[0].items[0], &SavedCards::new()).unwrap();
        assert!(results.iter().all(|r| r.category == "ride_hailing"));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_suggestion_groups_limit_and_empty_groups() {
        let engine = engine();

        // "pharmacy" is filed under categories the catalog never uses
        let pharmacy = engine.suggestion_groups("pharmacy", usize::MAX);
        assert!(pharmacy.iter().any(|g| g.category == "healthcare"));
        assert!(engine.suggestion_groups("zzz", usize::MAX).is_empty());

        let capped = engine.suggestion_groups("", 4);
        let total: usize = capped.iter().map(|g| g.items.len()).sum();
        assert_eq!(total, 4);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].category, "online_shopping");
        assert_eq!(capped[0].items, vec!["ecommerce", "Lazada", "online", "Shopee"]);
    }

    #[test]
    fn test_bundled_catalog() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/cards.json");
        let engine = SearchEngine::new(Catalog::from_file(path).unwrap(), SynonymTable::builtin());

        // "grab" hits both the merchant and the synonym route
        let grab = engine.search("Grab", &SavedCards::new()).unwrap();
        assert_eq!(grab[0].card, "UOB - PRVI Miles");
        assert!(grab.iter().any(|r| r.matched_merchant.as_deref() == Some("Grab")));

        let mcd = engine.search("mcd", &SavedCards::new()).unwrap();
        assert_eq!(mcd.len(), 1);
        assert_eq!(mcd[0].category, "dining_restaurants");
    }

    #[test]
    fn test_reload_only_on_change() {
        let mut engine = SearchEngine::new(
            Catalog::from_json_str(&sample_catalog_json().to_string()).unwrap(),
            SynonymTable::builtin(),
        );

        let same = Catalog::from_json_str(&sample_catalog_json().to_string()).unwrap();
        assert!(!engine.reload(same));

        let changed = Catalog::from_json_str(r#"{"HSBC": [{"card_name": "Revolution", "benefits": {}}]}"#)
            .unwrap();
        assert!(engine.reload(changed));
        assert_eq!(engine.cards().len(), 1);
        assert!(engine.search("dining", &SavedCards::new()).unwrap().is_empty());
    }
}
