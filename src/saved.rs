// ⭐ Saved Cards - Cards the user already owns
// The caller owns persistence (see db.rs); the core only tests membership

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Opaque (bank, card name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavedCardRef {
    pub bank: String,
    pub card_name: String,
}

impl SavedCardRef {
    pub fn new(bank: impl Into<String>, card_name: impl Into<String>) -> Self {
        SavedCardRef {
            bank: bank.into(),
            card_name: card_name.into(),
        }
    }
}

/// Insertion-ordered set of saved cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedCards {
    cards: IndexSet<SavedCardRef>,
}

impl SavedCards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, bank: &str, card_name: &str) -> bool {
        self.cards.contains(&SavedCardRef::new(bank, card_name))
    }

    /// Returns false if the card was already saved
    pub fn add(&mut self, bank: &str, card_name: &str) -> bool {
        self.cards.insert(SavedCardRef::new(bank, card_name))
    }

    /// Returns false if the card was not saved
    pub fn remove(&mut self, bank: &str, card_name: &str) -> bool {
        self.cards.shift_remove(&SavedCardRef::new(bank, card_name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedCardRef> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<SavedCardRef> for SavedCards {
    fn from_iter<I: IntoIterator<Item = SavedCardRef>>(iter: I) -> Self {
        SavedCards {
            cards: iter.into_iter().collect(),
        }
    }
}
