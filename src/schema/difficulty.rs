use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the story the player walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Giver,
    Seeker,
}

impl Role {
    /// Returns the content-table tag for this role ("giver" / "seeker").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Giver => "giver",
            Self::Seeker => "seeker",
        }
    }

    /// The role the other player must take in a shared room.
    pub fn counterpart(&self) -> Role {
        match self {
            Self::Giver => Self::Seeker,
            Self::Seeker => Self::Giver,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Role> {
        match tag.trim().to_lowercase().as_str() {
            "giver" => Some(Self::Giver),
            "seeker" => Some(Self::Seeker),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Difficulty tier, chosen once at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Parse a difficulty tag. Unrecognized tags fall back to `Medium`.
    pub fn from_tag(tag: &str) -> Difficulty {
        match tag.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }

    /// Select one of three per-tier values.
    pub fn tier<T>(&self, easy: T, medium: T, hard: T) -> T {
        match self {
            Self::Easy => easy,
            Self::Medium => medium,
            Self::Hard => hard,
        }
    }

    /// Multipliers applied to timing and complexity for this tier.
    /// Medium is the identity.
    pub fn modifiers(&self) -> DifficultyModifiers {
        match self {
            Self::Easy => DifficultyModifiers {
                time_limit: 1.5,
                hint_cooldown: 0.5,
                puzzle_complexity: 0.7,
                enemy_strength: 0.7,
            },
            Self::Medium => DifficultyModifiers::default(),
            Self::Hard => DifficultyModifiers {
                time_limit: 0.7,
                hint_cooldown: 1.5,
                puzzle_complexity: 1.3,
                enemy_strength: 1.3,
            },
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifiers {
    pub time_limit: f64,
    pub hint_cooldown: f64,
    pub puzzle_complexity: f64,
    pub enemy_strength: f64,
}

impl Default for DifficultyModifiers {
    fn default() -> Self {
        Self {
            time_limit: 1.0,
            hint_cooldown: 1.0,
            puzzle_complexity: 1.0,
            enemy_strength: 1.0,
        }
    }
}

/// A (chapter, level) pair, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub chapter: u8,
    pub level: u8,
}

impl Position {
    pub const START: Position = Position {
        chapter: 1,
        level: 1,
    };

    pub fn new(chapter: u8, level: u8) -> Self {
        Self { chapter, level }
    }

    /// Composite key used for the completed-levels set, e.g. "ch2-lv3".
    pub fn level_key(&self) -> String {
        format!("ch{}-lv{}", self.chapter, self.level)
    }

    /// Key used by the hint tables, e.g. "2-3".
    pub fn hint_key(&self) -> String {
        format!("{}-{}", self.chapter, self.level)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}
