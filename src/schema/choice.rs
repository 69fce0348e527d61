use serde::{Deserialize, Serialize};

/// A narrative decision offered at the end of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    /// Consequence tag. Only the ending resolver interprets it.
    pub consequence: String,
    #[serde(default)]
    pub kindling: u32,
}

/// An entry in the append-only choice history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub chapter: u8,
    pub level: u8,
    pub choice: Choice,
    /// Epoch milliseconds at the time the choice was recorded.
    pub timestamp: u64,
}

/// An inventory item. Identity is the normalized `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

impl Item {
    pub fn new(name: &str, icon: &str) -> Self {
        Self {
            id: item_id(name),
            name: name.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Normalize an item name into its inventory id: lower-cased, with each run
/// of whitespace replaced by a single `-`. Leading and trailing whitespace
/// is dropped rather than turned into edge dashes.
pub fn item_id(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
