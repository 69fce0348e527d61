use serde::{Deserialize, Serialize};
use std::fmt;

use super::difficulty::Difficulty;

/// The closed set of puzzle kinds a level can request.
///
/// Content tables name archetypes by kebab-case tag. Tags outside this set
/// resolve to `PatternMemory` through [`Archetype::from_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Archetype {
    PatternMemory,
    CipherDecode,
    MoralChoice,
    MemorySequence,
    FragmentAssembly,
    PhilosophicalChoice,
    SpatialPattern,
    LogicRiddle,
    MirrorPuzzle,
    SequenceIdentification,
    StealthStrategy,
    TemporalParadox,
    TimelineMapping,
    ParadoxPuzzle,
    CreativeSolution,
    TemporalInfluence,
    Synchronization,
    EmotionalNavigation,
    DialogueTree,
    TrustCoordination,
    RhythmSynchronization,
    FinalChoice,
    WordAssociation,
    ColorMatching,
    MathSequence,
    SymbolSubstitution,
    MazeNavigation,
    SlidingTile,
    Anagram,
}

impl Archetype {
    pub const ALL: [Archetype; 29] = [
        Self::PatternMemory,
        Self::CipherDecode,
        Self::MoralChoice,
        Self::MemorySequence,
        Self::FragmentAssembly,
        Self::PhilosophicalChoice,
        Self::SpatialPattern,
        Self::LogicRiddle,
        Self::MirrorPuzzle,
        Self::SequenceIdentification,
        Self::StealthStrategy,
        Self::TemporalParadox,
        Self::TimelineMapping,
        Self::ParadoxPuzzle,
        Self::CreativeSolution,
        Self::TemporalInfluence,
        Self::Synchronization,
        Self::EmotionalNavigation,
        Self::DialogueTree,
        Self::TrustCoordination,
        Self::RhythmSynchronization,
        Self::FinalChoice,
        Self::WordAssociation,
        Self::ColorMatching,
        Self::MathSequence,
        Self::SymbolSubstitution,
        Self::MazeNavigation,
        Self::SlidingTile,
        Self::Anagram,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::PatternMemory => "pattern-memory",
            Self::CipherDecode => "cipher-decode",
            Self::MoralChoice => "moral-choice",
            Self::MemorySequence => "memory-sequence",
            Self::FragmentAssembly => "fragment-assembly",
            Self::PhilosophicalChoice => "philosophical-choice",
            Self::SpatialPattern => "spatial-pattern",
            Self::LogicRiddle => "logic-riddle",
            Self::MirrorPuzzle => "mirror-puzzle",
            Self::SequenceIdentification => "sequence-identification",
            Self::StealthStrategy => "stealth-strategy",
            Self::TemporalParadox => "temporal-paradox",
            Self::TimelineMapping => "timeline-mapping",
            Self::ParadoxPuzzle => "paradox-puzzle",
            Self::CreativeSolution => "creative-solution",
            Self::TemporalInfluence => "temporal-influence",
            Self::Synchronization => "synchronization",
            Self::EmotionalNavigation => "emotional-navigation",
            Self::DialogueTree => "dialogue-tree",
            Self::TrustCoordination => "trust-coordination",
            Self::RhythmSynchronization => "rhythm-synchronization",
            Self::FinalChoice => "final-choice",
            Self::WordAssociation => "word-association",
            Self::ColorMatching => "color-matching",
            Self::MathSequence => "math-sequence",
            Self::SymbolSubstitution => "symbol-substitution",
            Self::MazeNavigation => "maze-navigation",
            Self::SlidingTile => "sliding-tile",
            Self::Anagram => "anagram",
        }
    }

    /// Look up an archetype by exact tag.
    pub fn parse(tag: &str) -> Option<Archetype> {
        Self::ALL.iter().copied().find(|a| a.tag() == tag)
    }

    /// Look up an archetype by tag, defaulting to `PatternMemory`.
    pub fn from_tag(tag: &str) -> Archetype {
        Self::parse(tag).unwrap_or(Self::PatternMemory)
    }

    /// True for the narrative archetypes whose only success condition is a
    /// single confirmation from the player.
    pub fn is_narrative(&self) -> bool {
        matches!(
            self,
            Self::MoralChoice
                | Self::FragmentAssembly
                | Self::PhilosophicalChoice
                | Self::SequenceIdentification
                | Self::StealthStrategy
                | Self::TimelineMapping
                | Self::ParadoxPuzzle
                | Self::CreativeSolution
                | Self::TemporalInfluence
                | Self::Synchronization
                | Self::EmotionalNavigation
                | Self::DialogueTree
                | Self::TrustCoordination
                | Self::FinalChoice
        )
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFragment {
    pub icon: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolKey {
    pub symbol: String,
    pub letter: char,
}

/// A cell of a carved maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MazeCell {
    Wall,
    Path,
    Start,
    End,
}

impl MazeCell {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Wall)
    }
}

/// A concrete puzzle instance produced for one level load.
///
/// Durations are milliseconds. Text answers are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PuzzleVariant {
    PatternMemory {
        pattern: Vec<String>,
        display_time_ms: u32,
        max_attempts: u32,
    },
    CipherDecode {
        encrypted: String,
        original: String,
        shift: u8,
        hint: Option<String>,
        max_attempts: u32,
    },
    MemorySequence {
        fragments: Vec<MemoryFragment>,
        correct_order: Vec<usize>,
        time_limit_ms: u32,
    },
    SpatialPattern {
        /// `grid[y][x]` is 0 for unvisited cells, otherwise the 1-based visit order.
        grid: Vec<Vec<u32>>,
        /// Visited cells as `(x, y)`, in visit order.
        path: Vec<(usize, usize)>,
        size: usize,
        time_limit_ms: u32,
    },
    LogicRiddle {
        question: String,
        answer: String,
        max_attempts: u32,
    },
    MirrorPuzzle {
        original: Vec<String>,
        mirrored: Vec<String>,
        time_limit_ms: u32,
    },
    TemporalParadox {
        question: String,
        options: Vec<String>,
        /// Index into `options` of the intended answer.
        correct: usize,
        time_limit_ms: u32,
    },
    RhythmSynchronization {
        sequence: Vec<u32>,
        tolerance_ms: u32,
        max_attempts: u32,
    },
    WordAssociation {
        words: Vec<String>,
        answer: String,
        max_attempts: u32,
    },
    ColorMatching {
        sequence: Vec<String>,
        display_time_ms: u32,
        max_attempts: u32,
    },
    MathSequence {
        sequence: Vec<i64>,
        answer: i64,
        hint: Option<String>,
        tolerance: i64,
        max_attempts: u32,
    },
    SymbolSubstitution {
        symbol_word: String,
        answer: String,
        key: Option<Vec<SymbolKey>>,
        max_attempts: u32,
    },
    MazeNavigation {
        maze: Vec<Vec<MazeCell>>,
        size: usize,
        time_limit_ms: u32,
    },
    SlidingTile {
        /// Row-major tiles; 0 is the empty slot.
        tiles: Vec<u32>,
        size: usize,
        moves: u32,
        max_moves: u32,
    },
    Anagram {
        scrambled: String,
        answer: String,
        hint: Option<String>,
        max_attempts: u32,
    },
    MoralChoice {
        show_consequences: bool,
    },
    FragmentAssembly {
        pieces: u32,
        rotatable: bool,
    },
    PhilosophicalChoice {
        time_limit_ms: Option<u32>,
    },
    SequenceIdentification {
        sequence_length: u32,
    },
    StealthStrategy {
        detection_range: f64,
    },
    TimelineMapping {
        event_count: u32,
    },
    ParadoxPuzzle {
        complexity: Difficulty,
    },
    CreativeSolution {
        accept_multiple_solutions: bool,
    },
    TemporalInfluence {
        influence_strength: f64,
    },
    Synchronization {
        sync_tolerance_ms: u32,
    },
    EmotionalNavigation {
        emotion_count: u32,
    },
    DialogueTree {
        max_depth: u32,
    },
    TrustCoordination {
        failure_consequence: String,
    },
    FinalChoice {
        time_to_decide_ms: Option<u32>,
        show_consequences: bool,
        allow_undo: bool,
    },
}

impl PuzzleVariant {
    pub fn archetype(&self) -> Archetype {
        match self {
            Self::PatternMemory { .. } => Archetype::PatternMemory,
            Self::CipherDecode { .. } => Archetype::CipherDecode,
            Self::MemorySequence { .. } => Archetype::MemorySequence,
            Self::SpatialPattern { .. } => Archetype::SpatialPattern,
            Self::LogicRiddle { .. } => Archetype::LogicRiddle,
            Self::MirrorPuzzle { .. } => Archetype::MirrorPuzzle,
            Self::TemporalParadox { .. } => Archetype::TemporalParadox,
            Self::RhythmSynchronization { .. } => Archetype::RhythmSynchronization,
            Self::WordAssociation { .. } => Archetype::WordAssociation,
            Self::ColorMatching { .. } => Archetype::ColorMatching,
            Self::MathSequence { .. } => Archetype::MathSequence,
            Self::SymbolSubstitution { .. } => Archetype::SymbolSubstitution,
            Self::MazeNavigation { .. } => Archetype::MazeNavigation,
            Self::SlidingTile { .. } => Archetype::SlidingTile,
            Self::Anagram { .. } => Archetype::Anagram,
            Self::MoralChoice { .. } => Archetype::MoralChoice,
            Self::FragmentAssembly { .. } => Archetype::FragmentAssembly,
            Self::PhilosophicalChoice { .. } => Archetype::PhilosophicalChoice,
            Self::SequenceIdentification { .. } => Archetype::SequenceIdentification,
            Self::StealthStrategy { .. } => Archetype::StealthStrategy,
            Self::TimelineMapping { .. } => Archetype::TimelineMapping,
            Self::ParadoxPuzzle { .. } => Archetype::ParadoxPuzzle,
            Self::CreativeSolution { .. } => Archetype::CreativeSolution,
            Self::TemporalInfluence { .. } => Archetype::TemporalInfluence,
            Self::Synchronization { .. } => Archetype::Synchronization,
            Self::EmotionalNavigation { .. } => Archetype::EmotionalNavigation,
            Self::DialogueTree { .. } => Archetype::DialogueTree,
            Self::TrustCoordination { .. } => Archetype::TrustCoordination,
            Self::FinalChoice { .. } => Archetype::FinalChoice,
        }
    }

    /// Attempt budget, for variants that carry one.
    pub fn max_attempts(&self) -> Option<u32> {
        match self {
            Self::PatternMemory { max_attempts, .. }
            | Self::CipherDecode { max_attempts, .. }
            | Self::LogicRiddle { max_attempts, .. }
            | Self::RhythmSynchronization { max_attempts, .. }
            | Self::WordAssociation { max_attempts, .. }
            | Self::ColorMatching { max_attempts, .. }
            | Self::MathSequence { max_attempts, .. }
            | Self::SymbolSubstitution { max_attempts, .. }
            | Self::Anagram { max_attempts, .. } => Some(*max_attempts),
            _ => None,
        }
    }

    /// Check a typed answer. Returns `None` for variants that are not
    /// answered with free text.
    pub fn check_answer(&self, input: &str) -> Option<bool> {
        let normalized = input.trim().to_lowercase();
        match self {
            Self::CipherDecode { original, .. } => Some(normalized == original.to_lowercase()),
            Self::LogicRiddle { answer, .. }
            | Self::WordAssociation { answer, .. }
            | Self::SymbolSubstitution { answer, .. }
            | Self::Anagram { answer, .. } => Some(normalized == *answer),
            Self::MathSequence {
                answer, tolerance, ..
            } => Some(
                normalized
                    .parse::<i64>()
                    .map(|n| (n - answer).abs() <= *tolerance)
                    .unwrap_or(false),
            ),
            Self::TemporalParadox {
                options, correct, ..
            } => Some(
                options
                    .get(*correct)
                    .map(|o| o.to_lowercase() == normalized)
                    .unwrap_or(false),
            ),
            _ => None,
        }
    }

    /// Check an ordered symbol sequence entered by the player. For the
    /// mirror puzzle the expected sequence is the mirrored one.
    pub fn check_sequence(&self, input: &[String]) -> Option<bool> {
        match self {
            Self::PatternMemory { pattern, .. } => Some(input == pattern.as_slice()),
            Self::ColorMatching { sequence, .. } => Some(input == sequence.as_slice()),
            Self::MirrorPuzzle { mirrored, .. } => Some(input == mirrored.as_slice()),
            _ => None,
        }
    }

    /// Check the cells clicked on a spatial-pattern grid against the path.
    pub fn check_path(&self, input: &[(usize, usize)]) -> Option<bool> {
        match self {
            Self::SpatialPattern { path, .. } => Some(input == path.as_slice()),
            _ => None,
        }
    }

    /// Check tap timestamps (ms since the first beat) against a rhythm.
    ///
    /// Intervals between consecutive taps are compared with the beat
    /// intervals from the second one onward, within the tolerance band.
    pub fn check_rhythm(&self, taps: &[u64]) -> Option<bool> {
        match self {
            Self::RhythmSynchronization {
                sequence,
                tolerance_ms,
                ..
            } => {
                if taps.len() != sequence.len() {
                    return Some(false);
                }
                let ok = taps
                    .windows(2)
                    .zip(sequence.iter().skip(1))
                    .all(|(pair, expected)| {
                        let interval = pair[1] as i64 - pair[0] as i64;
                        (interval - *expected as i64).abs() <= *tolerance_ms as i64
                    });
                Some(ok)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archetype_tags_round_trip() {
        for a in Archetype::ALL {
            assert_eq!(Archetype::parse(a.tag()), Some(a));
        }
    }

    #[test]
    fn unknown_archetype_falls_back_to_pattern_memory() {
        assert_eq!(Archetype::from_tag("moral-judgment"), Archetype::PatternMemory);
        assert_eq!(Archetype::from_tag(""), Archetype::PatternMemory);
        assert_eq!(Archetype::from_tag("anagram"), Archetype::Anagram);
    }

    #[test]
    fn narrative_archetypes() {
        assert!(Archetype::FinalChoice.is_narrative());
        assert!(Archetype::DialogueTree.is_narrative());
        assert!(!Archetype::CipherDecode.is_narrative());
    }

    #[test]
    fn variant_serializes_with_type_tag() {
        let v = PuzzleVariant::MoralChoice {
            show_consequences: true,
        };
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"type":"moral-choice","show_consequences":true}"#);
        assert_eq!(v.archetype(), Archetype::MoralChoice);
    }

    #[test]
    fn check_text_answers() {
        let riddle = PuzzleVariant::LogicRiddle {
            question: "What gets wetter as it dries?".to_string(),
            answer: "towel".to_string(),
            max_attempts: 5,
        };
        assert_eq!(riddle.check_answer("  Towel "), Some(true));
        assert_eq!(riddle.check_answer("sponge"), Some(false));
        assert_eq!(riddle.max_attempts(), Some(5));

        let cipher = PuzzleVariant::CipherDecode {
            encrypted: "UIF".to_string(),
            original: "THE".to_string(),
            shift: 1,
            hint: None,
            max_attempts: 1,
        };
        assert_eq!(cipher.check_answer("the"), Some(true));
    }

    #[test]
    fn math_tolerance() {
        let easy = PuzzleVariant::MathSequence {
            sequence: vec![2, 4, 6, 8],
            answer: 10,
            hint: Some("add 2".to_string()),
            tolerance: 1,
            max_attempts: 5,
        };
        assert_eq!(easy.check_answer("11"), Some(true));
        assert_eq!(easy.check_answer("12"), Some(false));
        assert_eq!(easy.check_answer("ten"), Some(false));
    }

    #[test]
    fn rhythm_uses_intervals_from_second_beat() {
        let rhythm = PuzzleVariant::RhythmSynchronization {
            sequence: vec![500, 750, 1000],
            tolerance_ms: 100,
            max_attempts: 3,
        };
        assert_eq!(rhythm.check_rhythm(&[0, 760, 1700]), Some(true));
        assert_eq!(rhythm.check_rhythm(&[0, 500, 1000]), Some(false));
        assert_eq!(rhythm.check_rhythm(&[0, 750]), Some(false));
        assert_eq!(rhythm.check_answer("x"), None);
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn spatial_path_must_match_in_order() {
        let spatial = PuzzleVariant::SpatialPattern {
            grid: vec![vec![1, 2, 0], vec![0, 3, 0], vec![0, 0, 0]],
            path: vec![(0, 0), (1, 0), (1, 1)],
            size: 3,
            time_limit_ms: 120_000,
        };
        assert_eq!(spatial.check_path(&[(0, 0), (1, 0), (1, 1)]), Some(true));
        assert_eq!(spatial.check_path(&[(0, 0), (1, 1), (1, 0)]), Some(false));
        assert_eq!(spatial.check_path(&[(0, 0), (1, 0)]), Some(false));

        let maze = PuzzleVariant::MazeNavigation {
            maze: vec![vec![MazeCell::Start, MazeCell::End]],
            size: 2,
            time_limit_ms: 60_000,
        };
        assert_eq!(maze.check_path(&[(0, 0)]), None);
    }

    #[test]
    fn sequences_compare_exactly() {
        let pattern = PuzzleVariant::PatternMemory {
            pattern: strings(&["❄", "★", "❄", "◆"]),
            display_time_ms: 5_000,
            max_attempts: 5,
        };
        assert_eq!(pattern.check_sequence(&strings(&["❄", "★", "❄", "◆"])), Some(true));
        assert_eq!(pattern.check_sequence(&strings(&["❄", "★", "◆", "❄"])), Some(false));
        assert_eq!(pattern.check_sequence(&strings(&["❄", "★", "❄"])), Some(false));

        let colors = PuzzleVariant::ColorMatching {
            sequence: strings(&["red", "blue", "gold"]),
            display_time_ms: 6_000,
            max_attempts: 4,
        };
        assert_eq!(colors.check_sequence(&strings(&["red", "blue", "gold"])), Some(true));
        assert_eq!(colors.check_sequence(&strings(&["blue", "red", "gold"])), Some(false));

        let mirror = PuzzleVariant::MirrorPuzzle {
            original: strings(&["◀", "●", "■"]),
            mirrored: strings(&["■", "●", "▶"]),
            time_limit_ms: 90_000,
        };
        assert_eq!(mirror.check_sequence(&strings(&["■", "●", "▶"])), Some(true));
        assert_eq!(mirror.check_sequence(&strings(&["◀", "●", "■"])), Some(false));
    }

    #[test]
    fn anagram_answer_ignores_case() {
        let anagram = PuzzleVariant::Anagram {
            scrambled: "WSON".to_string(),
            answer: "snow".to_string(),
            hint: Some("4 letters".to_string()),
            max_attempts: 5,
        };
        assert_eq!(anagram.check_answer(" SNOW "), Some(true));
        assert_eq!(anagram.check_answer("wson"), Some(false));
        assert_eq!(anagram.max_attempts(), Some(5));
    }

    #[test]
    fn temporal_paradox_answer_uses_correct_index() {
        let paradox = PuzzleVariant::TemporalParadox {
            question: "Which comes first?".to_string(),
            options: strings(&["The echo", "The Voice", "Silence"]),
            correct: 1,
            time_limit_ms: 90_000,
        };
        assert_eq!(paradox.check_answer("the voice"), Some(true));
        assert_eq!(paradox.check_answer("The echo"), Some(false));

        let out_of_range = PuzzleVariant::TemporalParadox {
            question: "?".to_string(),
            options: strings(&["a"]),
            correct: 4,
            time_limit_ms: 1,
        };
        assert_eq!(out_of_range.check_answer("a"), Some(false));
    }

    #[test]
    fn narrative_variants_have_no_answer() {
        let v = PuzzleVariant::DialogueTree { max_depth: 3 };
        assert_eq!(v.check_answer("anything"), None);
        assert_eq!(v.check_sequence(&[]), None);
        assert_eq!(v.max_attempts(), None);
    }
}
