//! The narrative content table: chapters, role branches, levels and endings.
//!
//! The table is read-only data loaded from RON. The engine never validates
//! it beyond lookups; a missing chapter or level is reported to the caller.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use super::choice::Choice;
use super::difficulty::{Position, Role};
use super::puzzle::Archetype;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid content: {0}")]
    Invalid(String),
}

/// The five terminal endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndingKey {
    ParadoxLiberation,
    CompassionateTwist,
    GratitudeEnding,
    SelfSacrifice,
    TransformationEnding,
}

impl EndingKey {
    pub const ALL: [EndingKey; 5] = [
        Self::ParadoxLiberation,
        Self::CompassionateTwist,
        Self::GratitudeEnding,
        Self::SelfSacrifice,
        Self::TransformationEnding,
    ];

    /// Key of this ending in the content table's `endings` map.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ParadoxLiberation => "paradox-liberation",
            Self::CompassionateTwist => "compassionate-twist",
            Self::GratitudeEnding => "gratitude-ending",
            Self::SelfSacrifice => "self-sacrifice",
            Self::TransformationEnding => "transformation-ending",
        }
    }
}

impl fmt::Display for EndingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ending {
    pub title: String,
    pub narrative: String,
    #[serde(default)]
    pub epilogue: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub id: u8,
    pub title: String,
    pub narrative: String,
    #[serde(default)]
    pub objective: String,
    /// Archetype tag; unknown tags fall back to pattern-memory.
    pub puzzle_type: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Level {
    pub fn archetype(&self) -> Archetype {
        Archetype::from_tag(&self.puzzle_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleBranch {
    #[serde(default)]
    pub intro: String,
    pub levels: Vec<Level>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u8,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub setting: String,
    /// Revelation shown before the chapter's first level, if any.
    #[serde(default)]
    pub twist: Option<String>,
    pub giver: RoleBranch,
    pub seeker: RoleBranch,
}

impl Chapter {
    pub fn branch(&self, role: Role) -> &RoleBranch {
        match role {
            Role::Giver => &self.giver,
            Role::Seeker => &self.seeker,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelHints {
    #[serde(default)]
    pub puzzle: Vec<String>,
    #[serde(default)]
    pub story: Vec<String>,
}

/// Hint text keyed by "chapter-level" and by archetype tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HintTable {
    #[serde(default)]
    pub levels: FxHashMap<String, LevelHints>,
    #[serde(default)]
    pub archetypes: FxHashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeTable {
    pub title: String,
    #[serde(default)]
    pub legend: String,
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub endings: FxHashMap<String, Ending>,
    #[serde(default)]
    pub item_icons: FxHashMap<String, String>,
    #[serde(default)]
    pub hints: HintTable,
}

/// Icon used for items the table has no icon for.
pub const DEFAULT_ITEM_ICON: &str = "📦";

impl NarrativeTable {
    /// Load a content table from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<NarrativeTable, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a content table from a RON string.
    pub fn parse_ron(input: &str) -> Result<NarrativeTable, ContentError> {
        let table: NarrativeTable = ron::from_str(input)?;
        if table.chapters.is_empty() {
            return Err(ContentError::Invalid("table has no chapters".to_string()));
        }
        Ok(table)
    }

    /// Chapter by 1-based index.
    pub fn chapter(&self, chapter: u8) -> Option<&Chapter> {
        let index = usize::from(chapter).checked_sub(1)?;
        self.chapters.get(index)
    }

    /// Level by 1-based position within a role branch.
    pub fn level(&self, role: Role, position: Position) -> Option<&Level> {
        let index = usize::from(position.level).checked_sub(1)?;
        self.chapter(position.chapter)?
            .branch(role)
            .levels
            .get(index)
    }

    pub fn ending(&self, key: EndingKey) -> Option<&Ending> {
        self.endings.get(key.tag())
    }

    pub fn item_icon(&self, name: &str) -> &str {
        self.item_icons
            .get(name)
            .map(String::as_str)
            .unwrap_or(DEFAULT_ITEM_ICON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"(
        title: "Test",
        chapters: [
            (
                id: 1,
                title: "One",
                giver: (levels: [
                    (id: 1, title: "G1", narrative: "n", puzzle_type: "cipher-decode",
                     items: ["Silver Compass"],
                     choices: [(text: "Go", consequence: "venture", kindling: 20)]),
                ]),
                seeker: (levels: [
                    (id: 1, title: "S1", narrative: "n", puzzle_type: "philosophical-inquiry"),
                ]),
            ),
        ],
        endings: {
            "gratitude-ending": (title: "Thanks", narrative: "..."),
        },
        item_icons: { "Silver Compass": "🧭" },
    )"#;

    #[test]
    fn parse_small_table() {
        let table = NarrativeTable::parse_ron(SMALL).unwrap();
        assert_eq!(table.chapters.len(), 1);
        let level = table.level(Role::Giver, Position::new(1, 1)).unwrap();
        assert_eq!(level.title, "G1");
        assert_eq!(level.archetype(), Archetype::CipherDecode);
        assert_eq!(level.choices[0].kindling, 20);
    }

    #[test]
    fn unknown_puzzle_type_defaults() {
        let table = NarrativeTable::parse_ron(SMALL).unwrap();
        let level = table.level(Role::Seeker, Position::new(1, 1)).unwrap();
        assert_eq!(level.archetype(), Archetype::PatternMemory);
    }

    #[test]
    fn missing_positions_are_none() {
        let table = NarrativeTable::parse_ron(SMALL).unwrap();
        assert!(table.chapter(0).is_none());
        assert!(table.chapter(2).is_none());
        assert!(table.level(Role::Giver, Position::new(1, 2)).is_none());
        assert!(table.level(Role::Giver, Position::new(1, 0)).is_none());
    }

    #[test]
    fn endings_and_icons() {
        let table = NarrativeTable::parse_ron(SMALL).unwrap();
        assert_eq!(table.ending(EndingKey::GratitudeEnding).unwrap().title, "Thanks");
        assert!(table.ending(EndingKey::SelfSacrifice).is_none());
        assert_eq!(table.item_icon("Silver Compass"), "🧭");
        assert_eq!(table.item_icon("Unknown Thing"), DEFAULT_ITEM_ICON);
    }

    #[test]
    fn empty_table_is_invalid() {
        let err = NarrativeTable::parse_ron(r#"(title: "x", chapters: [])"#).unwrap_err();
        assert!(matches!(err, ContentError::Invalid(_)));
    }

    #[test]
    fn malformed_ron_is_an_error() {
        assert!(matches!(
            NarrativeTable::parse_ron("(title: "),
            Err(ContentError::Ron(_))
        ));
    }
}
