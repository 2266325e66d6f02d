// 💳 Card Catalog - Banks, cards, and per-category benefits
// Lenient loader: malformed entries are skipped, never fatal

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

// ============================================================================
// CATALOG ENTITIES
// ============================================================================

/// A merchant named by a benefit, with optional alternative spellings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
}

impl Merchant {
    pub fn aliases(&self) -> &[String] {
        self.aliases.as_deref().unwrap_or(&[])
    }

    /// Name followed by every alias
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases().iter().map(String::as_str))
    }
}

/// Benefit attached to one (card, category) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    /// Free-text description ("5% cashback on dining")
    #[serde(default)]
    pub description: String,

    /// Raw numeric rewards value, used when the description yields no signal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewards: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchants: Option<Vec<Merchant>>,
}

impl Benefit {
    pub fn merchants(&self) -> &[Merchant] {
        self.merchants.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub card_name: String,

    /// Category key → benefit, in document order
    #[serde(default)]
    pub benefits: IndexMap<String, Benefit>,
}

// ============================================================================
// CATALOG
// ============================================================================

/// Bank → ordered card list, plus provenance of the source document
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    banks: IndexMap<String, Vec<Card>>,
    skipped_banks: Vec<String>,
    fingerprint: String,
}

impl Catalog {
    /// Load catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read catalog file: {:?}", path.as_ref()))?;

        Self::from_json_str(&content)
            .with_context(|| format!("Failed to load catalog: {:?}", path.as_ref()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).context("Failed to parse catalog JSON")?;
        Self::build(value, fingerprint(content))
    }

    /// Build a catalog from an already-parsed document.
    ///
    /// Only a non-object top level is an error. Anything malformed below it
    /// is dropped with a warning.
    pub fn from_value(value: Value) -> Result<Self> {
        let fingerprint = fingerprint(&value.to_string());
        Self::build(value, fingerprint)
    }

    fn build(value: Value, fingerprint: String) -> Result<Self> {
        let Value::Object(root) = value else {
            bail!("Catalog must be a JSON object mapping bank names to card lists");
        };

        let mut catalog = Catalog {
            fingerprint,
            ..Catalog::default()
        };

        for (bank, entry) in root {
            let Value::Array(raw_cards) = entry else {
                tracing::warn!(bank = %bank, "skipping bank entry that is not a card list");
                catalog.skipped_banks.push(bank);
                continue;
            };

            let cards: Vec<Card> = raw_cards
                .iter()
                .filter_map(|raw| parse_card(&bank, raw))
                .collect();
            catalog.banks.insert(bank, cards);
        }

        Ok(catalog)
    }

    pub fn banks(&self) -> impl Iterator<Item = (&str, &[Card])> {
        self.banks.iter().map(|(bank, cards)| (bank.as_str(), cards.as_slice()))
    }

    /// Cards of one bank; empty for unknown or skipped banks
    pub fn cards_for(&self, bank: &str) -> &[Card] {
        self.banks.get(bank).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn skipped_banks(&self) -> &[String] {
        &self.skipped_banks
    }

    /// SHA-256 of the source document (hex)
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn card_count(&self) -> usize {
        self.banks.values().map(Vec::len).sum()
    }
}

fn parse_card(bank: &str, raw: &Value) -> Option<Card> {
    let Some(obj) = raw.as_object() else {
        tracing::warn!(bank, "skipping card that is not an object");
        return None;
    };

    let Some(card_name) = obj
        .get("card_name")
        .or_else(|| obj.get("name"))
        .and_then(Value::as_str)
    else {
        tracing::warn!(bank, "skipping card without a name");
        return None;
    };

    let mut benefits = IndexMap::new();
    if let Some(raw_benefits) = obj.get("benefits").and_then(Value::as_object) {
        for (category, raw_benefit) in raw_benefits {
            match Benefit::deserialize(raw_benefit) {
                Ok(benefit) => {
                    benefits.insert(category.clone(), benefit);
                }
                Err(e) => {
                    tracing::warn!(bank, card = card_name, category = %category, error = %e, "skipping malformed benefit");
                }
            }
        }
    }

    Some(Card {
        card_name: card_name.to_string(),
        benefits,
    })
}

fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
