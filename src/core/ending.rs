//! Ending selection.
//!
//! Only the consequence tag of the most recent choice matters. Earlier
//! choices and the player's role are ignored.

use crate::schema::choice::ChoiceRecord;
use crate::schema::narrative::EndingKey;

/// Ending used when no choice has been recorded.
pub const DEFAULT_ENDING: EndingKey = EndingKey::GratitudeEnding;

/// Map a single consequence tag to an ending.
pub fn ending_for_consequence(tag: &str) -> EndingKey {
    match tag {
        "synthesis" | "paradox-liberation" => EndingKey::ParadoxLiberation,
        "mercy" | "compassionate-twist" => EndingKey::CompassionateTwist,
        "gratitude" | "gratitude-ending" => EndingKey::GratitudeEnding,
        "self-sacrifice" => EndingKey::SelfSacrifice,
        _ => EndingKey::TransformationEnding,
    }
}

/// Pick the ending for a finished playthrough.
pub fn resolve_ending(history: &[ChoiceRecord]) -> EndingKey {
    history
        .last()
        .map(|record| ending_for_consequence(&record.choice.consequence))
        .unwrap_or(DEFAULT_ENDING)
}
