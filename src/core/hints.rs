//! Level and archetype hints with a difficulty-scaled cooldown.

use log::debug;

use crate::core::progression::ProgressionState;
use crate::schema::difficulty::Position;
use crate::schema::narrative::HintTable;
use crate::schema::puzzle::Archetype;

/// Cooldown before difficulty scaling.
pub const BASE_HINT_COOLDOWN_MS: u64 = 30_000;

pub const COOLDOWN_MESSAGE: &str = "Hints are recharging... wait a moment.";
pub const GENERIC_HINT: &str =
    "Look carefully at the narrative. Often it contains clues to the solution.";

const ENCOURAGEMENT_HINT: &str =
    "You've tried several times. Perhaps try a completely different approach?";
const TIMEOUT_HINT: &str =
    "Taking your time is good, but don't overthink it. Sometimes the simplest answer is correct.";
const FALLBACK_DYNAMIC_HINT: &str = "Keep trying! You're making progress.";

/// Time on one puzzle after which the contextual hint nudges the player on.
const LONG_PUZZLE_MS: u64 = 300_000;

#[derive(Debug, Clone, PartialEq)]
pub enum HintResponse {
    Hint {
        text: String,
        used_this_level: u32,
        cooldown_ms: u64,
    },
    Cooldown {
        message: &'static str,
        remaining_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextualKind {
    Encouragement,
    Timeout,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextualHint {
    pub text: &'static str,
    pub kind: ContextualKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintProgress {
    pub available: usize,
    pub used: u32,
    pub remaining: usize,
}

#[derive(Debug, Clone)]
pub struct HintSystem {
    table: HintTable,
    base_cooldown_ms: u64,
    cooldown_until: Option<u64>,
    used_this_level: u32,
}

impl HintSystem {
    pub fn new(table: HintTable) -> Self {
        Self::with_base_cooldown(table, BASE_HINT_COOLDOWN_MS)
    }

    pub fn with_base_cooldown(table: HintTable, base_cooldown_ms: u64) -> Self {
        Self {
            table,
            base_cooldown_ms,
            cooldown_until: None,
            used_this_level: 0,
        }
    }

    pub fn used_this_level(&self) -> u32 {
        self.used_this_level
    }

    /// Look up the text for a hint without side effects.
    ///
    /// Level hints come first: the puzzle hint at `hint_level` when an
    /// archetype is given, else the story hint at `hint_level`, else the
    /// first puzzle hint. Then the archetype's hints, cycling. Then the
    /// generic hint.
    pub fn lookup(
        &self,
        position: Position,
        archetype: Option<Archetype>,
        hint_level: usize,
    ) -> String {
        if let Some(level) = self.table.levels.get(&position.hint_key()) {
            let found = archetype
                .and_then(|_| level.puzzle.get(hint_level))
                .or_else(|| level.story.get(hint_level))
                .or_else(|| level.puzzle.first());
            if let Some(text) = found {
                return text.clone();
            }
        }
        if let Some(hints) = archetype.and_then(|a| self.table.archetypes.get(a.tag())) {
            if !hints.is_empty() {
                return hints[hint_level % hints.len()].clone();
            }
        }
        GENERIC_HINT.to_string()
    }

    /// Give the next hint for the current position, counting it against the
    /// playthrough and starting the cooldown.
    pub fn request(
        &mut self,
        state: &mut ProgressionState,
        archetype: Option<Archetype>,
    ) -> HintResponse {
        let now = state.now_ms();
        if let Some(until) = self.cooldown_until {
            if now < until {
                return HintResponse::Cooldown {
                    message: COOLDOWN_MESSAGE,
                    remaining_ms: until - now,
                };
            }
        }

        let text = self.lookup(state.position(), archetype, self.used_this_level as usize);
        let cooldown_ms = (self.base_cooldown_ms as f64 * state.modifiers().hint_cooldown) as u64;
        self.cooldown_until = Some(now + cooldown_ms);
        self.used_this_level += 1;
        state.record_hint_used();
        debug!(
            "hint {} at {} (cooldown {cooldown_ms}ms)",
            self.used_this_level,
            state.position().hint_key()
        );

        HintResponse::Hint {
            text,
            used_this_level: self.used_this_level,
            cooldown_ms,
        }
    }

    /// Nudge based on how the current attempt is going.
    pub fn contextual_hint(
        &self,
        attempts: u32,
        elapsed_ms: u64,
        archetype: Archetype,
    ) -> ContextualHint {
        if attempts > 3 {
            return ContextualHint {
                text: ENCOURAGEMENT_HINT,
                kind: ContextualKind::Encouragement,
            };
        }
        if elapsed_ms > LONG_PUZZLE_MS {
            return ContextualHint {
                text: TIMEOUT_HINT,
                kind: ContextualKind::Timeout,
            };
        }
        let text = match archetype {
            Archetype::PatternMemory => {
                "Struggling with the sequence? Try saying the symbols out loud as they appear."
            }
            Archetype::CipherDecode => {
                "Stuck on the cipher? Remember that common words like THE and AND appear frequently."
            }
            Archetype::LogicRiddle => {
                "The riddle's answer is simpler than you think. Try the most obvious interpretation."
            }
            Archetype::SpatialPattern => "Can't find the path? Try starting from a different corner.",
            Archetype::RhythmSynchronization => {
                "Having trouble with timing? Try counting out loud: 'One, two, three, four...'"
            }
            _ => FALLBACK_DYNAMIC_HINT,
        };
        ContextualHint {
            text,
            kind: ContextualKind::Dynamic,
        }
    }

    pub fn progress(&self, position: Position) -> HintProgress {
        let available = self
            .table
            .levels
            .get(&position.hint_key())
            .map_or(0, |l| l.puzzle.len() + l.story.len());
        HintProgress {
            available,
            used: self.used_this_level,
            remaining: available.saturating_sub(self.used_this_level as usize),
        }
    }

    /// Levels without level-specific hints still allow the fallbacks.
    pub fn has_hints_available(&self, position: Position) -> bool {
        let progress = self.progress(position);
        progress.remaining > 0 || progress.available == 0
    }

    /// Clear the per-level counter. The cooldown carries over.
    pub fn reset_level(&mut self) {
        self.used_this_level = 0;
    }

    /// Clear the counter and the cooldown.
    pub fn reset(&mut self) {
        self.used_this_level = 0;
        self.cooldown_until = None;
    }
}
