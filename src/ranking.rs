// 🏆 Result Ranking - Saved cards first, then by score

use crate::matcher::MatchResult;
use serde::Serialize;

/// Default number of rows returned per query
pub const RESULT_LIMIT: usize = 5;

/// Benefit lines kept per card in the grouped view
pub const GROUP_BENEFIT_LIMIT: usize = 3;

/// Sort by score (descending, stable), move saved cards to the front, truncate
pub fn rank(mut results: Vec<MatchResult>, limit: usize) -> Vec<MatchResult> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    let (mut ranked, others): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.saved);
    ranked.extend(others);
    ranked.truncate(limit);
    ranked
}

// ============================================================================
// GROUPED VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedBenefit {
    pub category: String,
    pub description: String,
    pub score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_merchant: Option<String>,
}

/// All matching benefits of one card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardGroup {
    pub bank: String,
    pub card_name: String,
    pub card: String,
    pub saved: bool,
    pub best_score: f64,
    pub benefits: Vec<GroupedBenefit>,
}

impl CardGroup {
    pub fn best_benefit(&self) -> Option<&GroupedBenefit> {
        self.benefits.first()
    }
}

/// Merge rows of the same card, keeping the order in which cards first appear
pub fn group_by_card(results: &[MatchResult]) -> Vec<CardGroup> {
    let mut groups: Vec<CardGroup> = Vec::new();

    for result in results {
        let benefit = GroupedBenefit {
            category: result.category.clone(),
            description: result.description.clone(),
            score: result.score,
            matched_merchant: result.matched_merchant.clone(),
        };

        match groups
            .iter_mut()
            .find(|g| g.bank == result.bank && g.card_name == result.card_name)
        {
            Some(group) => {
                group.best_score = group.best_score.max(result.score);
                group.benefits.push(benefit);
            }
            None => groups.push(CardGroup {
                bank: result.bank.clone(),
                card_name: result.card_name.clone(),
                card: result.card.clone(),
                saved: result.saved,
                best_score: result.score,
                benefits: vec![benefit],
            }),
        }
    }

    for group in &mut groups {
        group.benefits.sort_by(|a, b| b.score.total_cmp(&a.score));
        group.benefits.truncate(GROUP_BENEFIT_LIMIT);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(bank: &str, card_name: &str, category: &str, score: f64, saved: bool) -> MatchResult {
        MatchResult {
            bank: bank.to_string(),
            card_name: card_name.to_string(),
            card: format!("{} - {}", bank, card_name),
            category: category.to_string(),
            description: format!("{} benefit", category),
            score,
            saved,
            matched_merchant: None,
        }
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let ranked = rank(
            vec![
                result("A", "one", "dining", 10.0, false),
                result("B", "two", "dining", 40.0, false),
                result("C", "three", "dining", 25.0, false),
            ],
            RESULT_LIMIT,
        );

        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![40.0, 25.0, 10.0]);
    }

    #[test]
    fn test_saved_first_regardless_of_score() {
        let ranked = rank(
            vec![
                result("A", "one", "dining", 80.0, false),
                result("B", "two", "dining", 5.0, true),
                result("C", "three", "dining", 60.0, false),
                result("D", "four", "dining", 12.0, true),
            ],
            RESULT_LIMIT,
        );

        let cards: Vec<&str> = ranked.iter().map(|r| r.card_name.as_str()).collect();
        assert_eq!(cards, vec!["four", "two", "one", "three"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = rank(
            vec![
                result("A", "first", "dining", 8.0, false),
                result("B", "second", "dining", 8.0, false),
                result("C", "third", "dining", 8.0, false),
            ],
            RESULT_LIMIT,
        );

        let cards: Vec<&str> = ranked.iter().map(|r| r.card_name.as_str()).collect();
        assert_eq!(cards, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let many: Vec<MatchResult> = (0..12)
            .map(|i| result("A", &format!("card{}", i), "dining", i as f64, i % 3 == 0))
            .collect();

        let ranked = rank(many, RESULT_LIMIT);
        assert_eq!(ranked.len(), RESULT_LIMIT);
        // 4 saved cards (0, 3, 6, 9) lead, best non-saved follows
        assert!(ranked[..4].iter().all(|r| r.saved));
        assert_eq!(ranked[4].card_name, "card11");
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new(), RESULT_LIMIT).is_empty());
    }

    #[test]
    fn test_group_by_card_merges_rows() {
        let rows = vec![
            result("UOB", "One", "dining", 80.0, false),
            result("DBS", "Altitude", "travel", 60.0, true),
            result("UOB", "One", "petrol", 152.0, false),
        ];

        let groups = group_by_card(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].card, "UOB - One");
        assert_eq!(groups[0].best_score, 152.0);
        assert_eq!(groups[0].best_benefit().unwrap().category, "petrol");
        assert!(groups[1].saved);
    }

    #[test]
    fn test_group_keeps_top_benefits_only() {
        let rows: Vec<MatchResult> = ["a", "b", "c", "d"]
            .iter()
            .enumerate()
            .map(|(i, cat)| result("OCBC", "365", cat, i as f64, false))
            .collect();

        let groups = group_by_card(&rows);

        assert_eq!(groups[0].benefits.len(), GROUP_BENEFIT_LIMIT);
        let cats: Vec<&str> = groups[0].benefits.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(cats, vec!["d", "c", "b"]);
    }
}
