// Best Card Finder - Core Library
// Matches a merchant/category query against a card catalog and ranks the benefits

pub mod catalog;
pub mod indexer;
pub mod synonyms;
pub mod query;
pub mod scoring;
pub mod matcher;
pub mod ranking;
pub mod saved;
pub mod search;
pub mod db;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use catalog::{Benefit, Card, Catalog, Merchant};
pub use indexer::{card_label, BenefitEntry, CardRef, CatalogIndex, SuggestionGroup};
pub use synonyms::SynonymTable;
pub use query::{expand_query, nice_label, normalize, parse_mcc, slugify_category, ExpandedQuery};
pub use scoring::{
    breakdown, score_benefit, score_description, ScoreBreakdown,
    MILES_PER_DOLLAR_WEIGHT, MULTIPLIER_WEIGHT, PERCENT_WEIGHT, UP_TO_PENALTY,
};
pub use matcher::{match_entry, MatchResult};
pub use ranking::{group_by_card, rank, CardGroup, GroupedBenefit, GROUP_BENEFIT_LIMIT, RESULT_LIMIT};
pub use saved::{SavedCardRef, SavedCards};
pub use search::{SearchEngine, SUGGESTION_LIMIT};
pub use db::{
    delete_saved_card, get_saved_card_records, insert_saved_card, load_saved_cards,
    open_database, setup_database, SavedCardRecord,
};
pub use config::AppConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
