// 🎯 Benefit Matcher - Does this benefit apply to the query?

use crate::catalog::{Benefit, Merchant};
use crate::indexer::{card_label, BenefitEntry};
use crate::query::{normalize, ExpandedQuery};
use crate::saved::SavedCards;
use crate::scoring::score_benefit;
use serde::{Deserialize, Serialize};

/// One matching (card, category) benefit, scored for a single query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub bank: String,
    pub card_name: String,

    /// "<bank> - <card name>"
    pub card: String,

    pub category: String,
    pub description: String,
    pub score: f64,
    pub saved: bool,

    /// Merchant whose name or alias equalled the query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_merchant: Option<String>,
}

/// First merchant whose name or any alias equals the normalized query
pub fn matching_merchant<'a>(benefit: &'a Benefit, query_norm: &str) -> Option<&'a Merchant> {
    benefit
        .merchants()
        .iter()
        .find(|merchant| merchant.names().any(|name| normalize(name) == query_norm))
}

pub fn category_matches(category: &str, expanded: &ExpandedQuery) -> bool {
    normalize(category).contains(&expanded.normalized) || expanded.has_category(category)
}

/// Match one benefit tuple against the query
pub fn match_entry(
    entry: &BenefitEntry<'_>,
    expanded: &ExpandedQuery,
    saved: &SavedCards,
) -> Option<MatchResult> {
    let merchant = matching_merchant(entry.benefit, &expanded.normalized);
    if merchant.is_none() && !category_matches(entry.category, expanded) {
        return None;
    }

    let description = if entry.benefit.description.trim().is_empty() {
        format!("Benefit in {}", entry.category)
    } else {
        entry.benefit.description.clone()
    };

    Some(MatchResult {
        bank: entry.bank.to_string(),
        card_name: entry.card.card_name.clone(),
        card: card_label(entry.bank, &entry.card.card_name),
        category: entry.category.to_string(),
        description,
        score: score_benefit(entry.benefit),
        saved: saved.contains(entry.bank, &entry.card.card_name),
        matched_merchant: merchant.map(|m| m.name.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;
    use crate::indexer::CatalogIndex;
    use crate::query::expand_query;
    use crate::synonyms::SynonymTable;

    fn matches_for(query: &str, saved: &SavedCards) -> Vec<MatchResult> {
        let index = CatalogIndex::build(sample_catalog());
        let expanded = expand_query(query, index.categories(), &SynonymTable::builtin());
        index
            .entries()
            .filter_map(|entry| match_entry(&entry, &expanded, saved))
            .collect()
    }

    #[test]
    fn test_alias_match_is_case_insensitive_and_exact() {
        let hits = matches_for("NTUC", &SavedCards::new());

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].card, "OCBC - 365");
        assert_eq!(hits[0].category, "supermarkets");
        assert_eq!(hits[0].matched_merchant.as_deref(), Some("FairPrice"));

        // Substring of an alias is not a merchant match
        assert!(matches_for("ntu", &SavedCards::new()).is_empty());
    }

    #[test]
    fn test_synonym_category_match_without_merchant_mention() {
        let hits = matches_for("grab", &SavedCards::new());

        let cards: Vec<&str> = hits.iter().map(|h| h.card.as_str()).collect();
        assert_eq!(cards, vec!["DBS - Live Fresh", "UOB - PRVI Miles"]);
        assert!(hits.iter().all(|h| h.category == "ride_hailing"));
        assert!(hits.iter().all(|h| h.matched_merchant.is_none()));
    }

    #[test]
    fn test_category_key_substring_match() {
        let hits = matches_for("restaurants", &SavedCards::new());
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.category == "dining_restaurants"));
    }

    #[test]
    fn test_saved_flag_uses_bank_and_card_name() {
        let mut saved = SavedCards::new();
        saved.add("UOB", "PRVI Miles");
        // Same card name under another bank must not count
        saved.add("DBS", "PRVI Miles");

        let hits = matches_for("gojek", &saved);
        let prvi = hits.iter().find(|h| h.card_name == "PRVI Miles").unwrap();
        let live_fresh = hits.iter().find(|h| h.card_name == "Live Fresh").unwrap();

        assert!(prvi.saved);
        assert!(!live_fresh.saved);
    }

    #[test]
    fn test_score_attached_with_rewards_fallback() {
        let hits = matches_for("ride_hailing", &SavedCards::new());

        let live_fresh = hits.iter().find(|h| h.card_name == "Live Fresh").unwrap();
        let prvi = hits.iter().find(|h| h.card_name == "PRVI Miles").unwrap();
        assert_eq!(live_fresh.score, 3.0);
        assert_eq!(prvi.score, 12.0);
    }

    #[test]
    fn test_blank_description_gets_placeholder() {
        let benefit = Benefit {
            description: "  ".to_string(),
            rewards: None,
            merchants: None,
        };
        let card = crate::catalog::Card {
            card_name: "Basic".to_string(),
            benefits: Default::default(),
        };
        let entry = BenefitEntry {
            bank: "HSBC",
            card: &card,
            category: "petrol",
            benefit: &benefit,
        };
        let expanded = expand_query("petrol", &Default::default(), &SynonymTable::new());

        let hit = match_entry(&entry, &expanded, &SavedCards::new()).unwrap();
        assert_eq!(hit.description, "Benefit in petrol");
        assert_eq!(hit.score, 0.0);
    }
}
