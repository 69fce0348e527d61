//! Achievement rule table.
//!
//! Rules are pure predicates over [`PlaythroughData`]. Once an achievement
//! is recorded it stays recorded, even if the predicate later turns false.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::progression::PlaythroughData;

/// A level finished faster than this earns `speed_runner`.
pub const SPEED_RUN_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    KindlingCollector,
    KindlingMaster,
    NoHints,
    SpeedRunner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
}

pub const ACHIEVEMENTS: [Achievement; 4] = [
    Achievement {
        id: AchievementId::KindlingCollector,
        name: "Kindling Collector",
        description: "Collect 100 kindling points",
    },
    Achievement {
        id: AchievementId::KindlingMaster,
        name: "Kindling Master",
        description: "Collect 500 kindling points",
    },
    Achievement {
        id: AchievementId::NoHints,
        name: "Unaided Journey",
        description: "Complete a chapter without using hints",
    },
    Achievement {
        id: AchievementId::SpeedRunner,
        name: "Swift as Winter Wind",
        description: "Complete a level in under 5 minutes",
    },
];

impl AchievementId {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::KindlingCollector => "kindling_collector",
            Self::KindlingMaster => "kindling_master",
            Self::NoHints => "no_hints",
            Self::SpeedRunner => "speed_runner",
        }
    }

    pub fn info(&self) -> &'static Achievement {
        match self {
            Self::KindlingCollector => &ACHIEVEMENTS[0],
            Self::KindlingMaster => &ACHIEVEMENTS[1],
            Self::NoHints => &ACHIEVEMENTS[2],
            Self::SpeedRunner => &ACHIEVEMENTS[3],
        }
    }

    pub fn is_satisfied(&self, data: &PlaythroughData) -> bool {
        match self {
            Self::KindlingCollector => data.kindling_points >= 100,
            Self::KindlingMaster => data.kindling_points >= 500,
            Self::NoHints => data.hints_used == 0 && data.position.level == 1,
            Self::SpeedRunner => data.fastest_level_ms.is_some_and(|ms| ms < SPEED_RUN_MS),
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Achievements satisfied by `data` that are not yet recorded, in table order.
pub fn newly_satisfied(data: &PlaythroughData) -> Vec<AchievementId> {
    ACHIEVEMENTS
        .iter()
        .map(|a| a.id)
        .filter(|id| !data.achievements.contains(id) && id.is_satisfied(data))
        .collect()
}
