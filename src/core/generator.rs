//! Procedural puzzle generation: difficulty-scaled variants per archetype.
//!
//! A `ProceduralGenerator` lives for a whole playthrough and threads one
//! [`SeededRandom`] through every call. Individual calls are therefore not
//! reproducible on their own; the full call sequence from construction is.

use serde::{Deserialize, Serialize};

use crate::core::cipher::caesar_encrypt;
use crate::core::grid::{carve_maze, random_walk, scramble_tiles};
use crate::core::rng::SeededRandom;
use crate::schema::difficulty::Difficulty;
use crate::schema::puzzle::{Archetype, MemoryFragment, PuzzleVariant, SymbolKey};

const PATTERN_SYMBOLS: &[&str] = &["🎄", "⛄", "🎁", "❄️", "🔔", "⭐", "🕯️", "🎅"];

const CIPHER_MESSAGES: &[&str] = &[
    "THE FLAME BURNS IN THE OLDEST TREE",
    "FOLLOW THE NORTH STAR TO SALVATION",
    "WARMTH LIES BENEATH THE FROZEN LAKE",
    "THE SEEKER COMES AT MIDNIGHT",
    "BREAK THE CYCLE WITH PARADOX",
];

const MEMORY_FRAGMENTS: &[(&str, &str)] = &[
    ("🏠", "A warm cottage"),
    ("👥", "Laughing faces"),
    ("🔥", "A hearth fire"),
    ("❄️", "First snowfall"),
    ("🎵", "A lullaby"),
    ("🌙", "Moonlight on ice"),
    ("⭐", "Wishing on stars"),
    ("🎁", "A precious gift"),
];

struct Riddle {
    question: &'static str,
    answer: &'static str,
}

const RIDDLES_EASY: &[Riddle] = &[
    Riddle {
        question: "I speak without a mouth and hear without ears. I have no body, but come alive with wind. What am I?",
        answer: "echo",
    },
    Riddle {
        question: "What gets wetter as it dries?",
        answer: "towel",
    },
    Riddle {
        question: "I'm light as a feather, yet the strongest person can't hold me for five minutes. What am I?",
        answer: "breath",
    },
];

const RIDDLES_MEDIUM: &[Riddle] = &[
    Riddle {
        question: "Forward I'm heavy, backward I'm not. What am I?",
        answer: "ton",
    },
    Riddle {
        question: "I have cities but no houses, forests but no trees, water but no fish. What am I?",
        answer: "map",
    },
    Riddle {
        question: "The more you take, the more you leave behind. What am I?",
        answer: "footsteps",
    },
];

const RIDDLES_HARD: &[Riddle] = &[
    Riddle {
        question: "I am the beginning of everything, the end of everywhere. I'm the beginning of eternity, the end of time and space. What am I?",
        answer: "e",
    },
    Riddle {
        question: "What has roots that nobody sees, is taller than trees, up up it goes, yet never grows?",
        answer: "mountain",
    },
    Riddle {
        question: "Alive without breath, cold as death, never thirsty, always drinking. What am I?",
        answer: "fish",
    },
];

const MIRROR_SYMBOLS: &[&str] = &["▲", "▼", "◀", "▶", "★", "●", "■", "◆"];

struct ParadoxScenario {
    question: &'static str,
    options: [&'static str; 4],
    correct: usize,
}

const PARADOX_SCENARIOS: &[ParadoxScenario] = &[
    ParadoxScenario {
        question: "If you prevent your past self from entering the forest, you never gain the knowledge to travel back. What happens?",
        options: [
            "Timeline splits",
            "Paradox resolves itself",
            "You cease to exist",
            "Time loops infinitely",
        ],
        correct: 0,
    },
    ParadoxScenario {
        question: "The Seeker is your future. If you change the future, are you still you?",
        options: [
            "Yes, identity is continuous",
            "No, you become someone new",
            "Both simultaneously",
            "Identity is an illusion",
        ],
        correct: 2,
    },
    ParadoxScenario {
        question: "Can an effect precede its cause if both exist outside time?",
        options: [
            "No, causality is absolute",
            "Yes, in non-linear time",
            "The question is meaningless",
            "Causality itself is the illusion",
        ],
        correct: 1,
    },
];

const BEAT_INTERVALS_MS: &[u32] = &[500, 750, 1000, 1250];

struct WordSet {
    words: [&'static str; 4],
    answer: &'static str,
}

const WORDS_EASY: &[WordSet] = &[
    WordSet {
        words: ["snow", "cold", "winter", "ice"],
        answer: "frost",
    },
    WordSet {
        words: ["gift", "wrap", "bow", "surprise"],
        answer: "present",
    },
    WordSet {
        words: ["fire", "warmth", "light", "burn"],
        answer: "flame",
    },
];

const WORDS_MEDIUM: &[WordSet] = &[
    WordSet {
        words: ["memory", "forget", "past", "nostalgia"],
        answer: "remember",
    },
    WordSet {
        words: ["cycle", "repeat", "loop", "again"],
        answer: "eternal",
    },
    WordSet {
        words: ["choice", "path", "decision", "fork"],
        answer: "crossroads",
    },
];

const WORDS_HARD: &[WordSet] = &[
    WordSet {
        words: ["paradox", "time", "loop", "contradiction"],
        answer: "causality",
    },
    WordSet {
        words: ["soul", "essence", "self", "identity"],
        answer: "consciousness",
    },
    WordSet {
        words: ["sacrifice", "give", "offer", "surrender"],
        answer: "devotion",
    },
];

const COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "purple", "orange", "white", "silver",
];

struct NumberPattern {
    sequence: &'static [i64],
    next: i64,
    rule: &'static str,
}

const NUMBERS_EASY: &[NumberPattern] = &[
    NumberPattern {
        sequence: &[2, 4, 6, 8],
        next: 10,
        rule: "add 2",
    },
    NumberPattern {
        sequence: &[5, 10, 15, 20],
        next: 25,
        rule: "add 5",
    },
    NumberPattern {
        sequence: &[1, 2, 4, 8],
        next: 16,
        rule: "multiply by 2",
    },
];

const NUMBERS_MEDIUM: &[NumberPattern] = &[
    NumberPattern {
        sequence: &[1, 1, 2, 3, 5],
        next: 8,
        rule: "fibonacci",
    },
    NumberPattern {
        sequence: &[1, 4, 9, 16],
        next: 25,
        rule: "squares",
    },
    NumberPattern {
        sequence: &[2, 6, 12, 20],
        next: 30,
        rule: "n*(n+1)",
    },
];

const NUMBERS_HARD: &[NumberPattern] = &[
    NumberPattern {
        sequence: &[1, 2, 6, 24],
        next: 120,
        rule: "factorial",
    },
    NumberPattern {
        sequence: &[2, 3, 5, 7, 11],
        next: 13,
        rule: "primes",
    },
    NumberPattern {
        sequence: &[1, 8, 27, 64],
        next: 125,
        rule: "cubes",
    },
];

const SUBSTITUTION_KEY: &[(&str, char)] = &[
    ("🔥", 'A'),
    ("❄️", 'E'),
    ("⭐", 'I'),
    ("🎄", 'O'),
    ("🎁", 'T'),
    ("🔔", 'S'),
    ("🕯️", 'N'),
    ("⛄", 'R'),
];

const SUBSTITUTION_WORDS_EASY: &[&str] = &["FIRE", "STAR", "TREE"];
const SUBSTITUTION_WORDS_MEDIUM: &[&str] = &["WINTER", "FROST", "SEEKER"];
const SUBSTITUTION_WORDS_HARD: &[&str] = &["KINDLING", "ETERNITY", "TRANSFORMATION"];

const ANAGRAM_EASY: &[&str] = &["FLAME", "WINTER", "FROST", "MAGIC"];
const ANAGRAM_MEDIUM: &[&str] = &["KINDLING", "SEEKER", "GIVER", "SPIRIT"];
const ANAGRAM_HARD: &[&str] = &["TRANSFORMATION", "PARADOX", "ETERNITY", "CONSCIOUSNESS"];

/// Legal slides applied when scrambling a sliding-tile board.
const SLIDING_SCRAMBLE_MOVES: u32 = 50;

const WEATHER: &[&str] = &["light-snow", "heavy-snow", "blizzard", "clear-frost", "aurora"];
const TIME_OF_DAY: &[&str] = &["dusk", "midnight", "pre-dawn", "eternal-twilight"];
const ATMOSPHERES: &[&str] = &["peaceful", "eerie", "mystical", "tense", "melancholic"];
const DECORATION_KINDS: &[&str] = &[
    "icicle",
    "frost-pattern",
    "snowdrift",
    "frozen-branch",
    "ice-crystal",
];
const DIALOGUE_PREFIXES: &[&str] = &[
    "Listen well: ",
    "I must tell you: ",
    "Pay attention: ",
    "Heed my words: ",
    "Mark this: ",
];
const DIALOGUE_SUFFIXES: &[&str] = &[
    "...or so the old tales say.",
    "...though I may be mistaken.",
    "...if my memory serves.",
    "...as it has always been.",
    "...make of that what you will.",
];

/// Cosmetic scene parameters for a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub weather: String,
    pub time_of_day: String,
    pub atmosphere: String,
    pub snowfall_intensity: f64,
    pub wind_speed: f64,
    pub visibility: f64,
    pub ambient_light: f64,
}

/// A decorative sprite placed in percentage coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub rotation: f64,
    pub opacity: f64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct ProceduralGenerator {
    seed: u32,
    rng: SeededRandom,
}

impl ProceduralGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            rng: SeededRandom::new(seed),
        }
    }

    /// The seed this generator was constructed with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Produce the variant for one level load.
    pub fn generate_variant(
        &mut self,
        archetype: Archetype,
        difficulty: Difficulty,
    ) -> PuzzleVariant {
        let d = difficulty;
        match archetype {
            Archetype::PatternMemory => self.pattern_memory(d),
            Archetype::CipherDecode => self.cipher(d),
            Archetype::MemorySequence => self.memory_sequence(d),
            Archetype::SpatialPattern => self.spatial_pattern(d),
            Archetype::LogicRiddle => self.logic_riddle(d),
            Archetype::MirrorPuzzle => self.mirror_puzzle(d),
            Archetype::TemporalParadox => self.temporal_paradox(d),
            Archetype::RhythmSynchronization => self.rhythm(d),
            Archetype::WordAssociation => self.word_association(d),
            Archetype::ColorMatching => self.color_matching(d),
            Archetype::MathSequence => self.math_sequence(d),
            Archetype::SymbolSubstitution => self.symbol_substitution(d),
            Archetype::MazeNavigation => self.maze_navigation(d),
            Archetype::SlidingTile => self.sliding_tile(d),
            Archetype::Anagram => self.anagram(d),
            Archetype::MoralChoice => PuzzleVariant::MoralChoice {
                show_consequences: d == Difficulty::Easy,
            },
            Archetype::FragmentAssembly => PuzzleVariant::FragmentAssembly {
                pieces: d.tier(4, 6, 9),
                rotatable: d != Difficulty::Easy,
            },
            Archetype::PhilosophicalChoice => PuzzleVariant::PhilosophicalChoice {
                time_limit_ms: (d == Difficulty::Hard).then_some(90_000),
            },
            Archetype::SequenceIdentification => PuzzleVariant::SequenceIdentification {
                sequence_length: d.tier(5, 7, 9),
            },
            Archetype::StealthStrategy => PuzzleVariant::StealthStrategy {
                detection_range: if d == Difficulty::Hard { 1.5 } else { 1.0 },
            },
            Archetype::TimelineMapping => PuzzleVariant::TimelineMapping {
                event_count: d.tier(5, 8, 12),
            },
            Archetype::ParadoxPuzzle => PuzzleVariant::ParadoxPuzzle { complexity: d },
            Archetype::CreativeSolution => PuzzleVariant::CreativeSolution {
                accept_multiple_solutions: d == Difficulty::Easy,
            },
            Archetype::TemporalInfluence => PuzzleVariant::TemporalInfluence {
                influence_strength: if d == Difficulty::Hard { 0.5 } else { 1.0 },
            },
            Archetype::Synchronization => PuzzleVariant::Synchronization {
                sync_tolerance_ms: d.tier(500, 300, 150),
            },
            Archetype::EmotionalNavigation => PuzzleVariant::EmotionalNavigation {
                emotion_count: d.tier(3, 5, 7),
            },
            Archetype::DialogueTree => PuzzleVariant::DialogueTree {
                max_depth: d.tier(2, 3, 4),
            },
            Archetype::TrustCoordination => PuzzleVariant::TrustCoordination {
                failure_consequence: if d == Difficulty::Hard {
                    "severe".to_string()
                } else {
                    "moderate".to_string()
                },
            },
            Archetype::FinalChoice => PuzzleVariant::FinalChoice {
                time_to_decide_ms: d.tier(None, Some(60_000), Some(30_000)),
                show_consequences: d == Difficulty::Easy,
                allow_undo: d != Difficulty::Hard,
            },
        }
    }

    /// Tag-based entry point: unknown archetypes become pattern-memory and
    /// unknown difficulties become medium.
    pub fn generate_for_tags(&mut self, archetype: &str, difficulty: &str) -> PuzzleVariant {
        self.generate_variant(Archetype::from_tag(archetype), Difficulty::from_tag(difficulty))
    }

    fn pattern_memory(&mut self, d: Difficulty) -> PuzzleVariant {
        let length = d.tier(4, 6, 8);
        let pattern = (0..length)
            .map(|_| self.rng.pick(PATTERN_SYMBOLS).to_string())
            .collect();
        PuzzleVariant::PatternMemory {
            pattern,
            display_time_ms: d.tier(5_000, 3_000, 2_000),
            max_attempts: d.tier(5, 3, 2),
        }
    }

    fn cipher(&mut self, d: Difficulty) -> PuzzleVariant {
        let message = *self.rng.pick(CIPHER_MESSAGES);
        let shift = self.rng.next_int(1, 25) as u8;
        PuzzleVariant::CipherDecode {
            encrypted: caesar_encrypt(message, shift),
            original: message.to_string(),
            shift,
            hint: d.tier(
                Some(format!("Shift by {shift}")),
                Some("Caesar cipher".to_string()),
                None,
            ),
            max_attempts: d.tier(5, 3, 1),
        }
    }

    fn memory_sequence(&mut self, d: Difficulty) -> PuzzleVariant {
        let count = d.tier(3, 5, 7);
        let fragments = self
            .rng
            .shuffled(MEMORY_FRAGMENTS)
            .into_iter()
            .take(count)
            .map(|(icon, text)| MemoryFragment {
                icon: icon.to_string(),
                text: text.to_string(),
            })
            .collect();
        let order: Vec<usize> = (0..count).collect();
        PuzzleVariant::MemorySequence {
            fragments,
            correct_order: self.rng.shuffled(&order),
            time_limit_ms: d.tier(60_000, 45_000, 30_000),
        }
    }

    fn spatial_pattern(&mut self, d: Difficulty) -> PuzzleVariant {
        let size = d.tier(3, 4, 5);
        let walk = random_walk(&mut self.rng, size);
        PuzzleVariant::SpatialPattern {
            grid: walk.grid,
            path: walk.path,
            size,
            time_limit_ms: d.tier(120_000, 90_000, 60_000),
        }
    }

    fn logic_riddle(&mut self, d: Difficulty) -> PuzzleVariant {
        let riddle = self.rng.pick(d.tier(RIDDLES_EASY, RIDDLES_MEDIUM, RIDDLES_HARD));
        PuzzleVariant::LogicRiddle {
            question: riddle.question.to_string(),
            answer: riddle.answer.to_lowercase(),
            max_attempts: d.tier(5, 3, 2),
        }
    }

    fn mirror_puzzle(&mut self, d: Difficulty) -> PuzzleVariant {
        let count = d.tier(4, 6, 8);
        let original: Vec<String> = (0..count)
            .map(|_| self.rng.pick(MIRROR_SYMBOLS).to_string())
            .collect();
        let mirrored = original
            .iter()
            .rev()
            .map(|s| match s.as_str() {
                "◀" => "▶".to_string(),
                "▶" => "◀".to_string(),
                other => other.to_string(),
            })
            .collect();
        PuzzleVariant::MirrorPuzzle {
            original,
            mirrored,
            time_limit_ms: d.tier(90_000, 60_000, 45_000),
        }
    }

    fn temporal_paradox(&mut self, d: Difficulty) -> PuzzleVariant {
        let scenario = self.rng.pick(PARADOX_SCENARIOS);
        let mut order: Vec<usize> = (0..scenario.options.len()).collect();
        if d != Difficulty::Easy {
            self.rng.shuffle(&mut order);
        }
        let correct = order
            .iter()
            .position(|&i| i == scenario.correct)
            .unwrap_or(scenario.correct);
        PuzzleVariant::TemporalParadox {
            question: scenario.question.to_string(),
            options: order.iter().map(|&i| scenario.options[i].to_string()).collect(),
            correct,
            time_limit_ms: d.tier(120_000, 90_000, 60_000),
        }
    }

    fn rhythm(&mut self, d: Difficulty) -> PuzzleVariant {
        let count = d.tier(4, 6, 8);
        let sequence = (0..count).map(|_| *self.rng.pick(BEAT_INTERVALS_MS)).collect();
        PuzzleVariant::RhythmSynchronization {
            sequence,
            tolerance_ms: d.tier(200, 150, 100),
            max_attempts: d.tier(5, 3, 2),
        }
    }

    fn word_association(&mut self, d: Difficulty) -> PuzzleVariant {
        let set = self.rng.pick(d.tier(WORDS_EASY, WORDS_MEDIUM, WORDS_HARD));
        let words = strings(&set.words);
        PuzzleVariant::WordAssociation {
            words: if d == Difficulty::Easy {
                words
            } else {
                self.rng.shuffled(&words)
            },
            answer: set.answer.to_lowercase(),
            max_attempts: d.tier(5, 3, 2),
        }
    }

    fn color_matching(&mut self, d: Difficulty) -> PuzzleVariant {
        let count = d.tier(4, 6, 8);
        let sequence = (0..count).map(|_| self.rng.pick(COLORS).to_string()).collect();
        PuzzleVariant::ColorMatching {
            sequence,
            display_time_ms: d.tier(6_000, 4_000, 3_000),
            max_attempts: d.tier(4, 3, 2),
        }
    }

    fn math_sequence(&mut self, d: Difficulty) -> PuzzleVariant {
        let pattern = self.rng.pick(d.tier(NUMBERS_EASY, NUMBERS_MEDIUM, NUMBERS_HARD));
        PuzzleVariant::MathSequence {
            sequence: pattern.sequence.to_vec(),
            answer: pattern.next,
            hint: (d == Difficulty::Easy).then(|| pattern.rule.to_string()),
            tolerance: d.tier(1, 0, 0),
            max_attempts: d.tier(5, 3, 2),
        }
    }

    fn symbol_substitution(&mut self, d: Difficulty) -> PuzzleVariant {
        let word = *self.rng.pick(d.tier(
            SUBSTITUTION_WORDS_EASY,
            SUBSTITUTION_WORDS_MEDIUM,
            SUBSTITUTION_WORDS_HARD,
        ));
        let symbol_word = word
            .chars()
            .map(|letter| {
                SUBSTITUTION_KEY
                    .iter()
                    .find(|(_, l)| *l == letter)
                    .map(|(symbol, _)| symbol.to_string())
                    .unwrap_or_else(|| letter.to_string())
            })
            .collect();
        let key = (d == Difficulty::Easy).then(|| {
            SUBSTITUTION_KEY
                .iter()
                .map(|(symbol, letter)| SymbolKey {
                    symbol: symbol.to_string(),
                    letter: *letter,
                })
                .collect()
        });
        PuzzleVariant::SymbolSubstitution {
            symbol_word,
            answer: word.to_lowercase(),
            key,
            max_attempts: d.tier(5, 3, 2),
        }
    }

    fn maze_navigation(&mut self, d: Difficulty) -> PuzzleVariant {
        let size = d.tier(5, 7, 9);
        PuzzleVariant::MazeNavigation {
            maze: carve_maze(&mut self.rng, size),
            size,
            time_limit_ms: d.tier(180_000, 120_000, 90_000),
        }
    }

    fn sliding_tile(&mut self, d: Difficulty) -> PuzzleVariant {
        let size = d.tier(3, 4, 5);
        PuzzleVariant::SlidingTile {
            tiles: scramble_tiles(&mut self.rng, size, SLIDING_SCRAMBLE_MOVES),
            size,
            moves: 0,
            max_moves: d.tier(100, 75, 50),
        }
    }

    fn anagram(&mut self, d: Difficulty) -> PuzzleVariant {
        let word = *self.rng.pick(d.tier(ANAGRAM_EASY, ANAGRAM_MEDIUM, ANAGRAM_HARD));
        let letters: Vec<char> = word.chars().collect();
        PuzzleVariant::Anagram {
            scrambled: self.rng.shuffled(&letters).into_iter().collect(),
            answer: word.to_lowercase(),
            hint: (d == Difficulty::Easy).then(|| format!("{} letters", letters.len())),
            max_attempts: d.tier(5, 3, 2),
        }
    }

    /// Cosmetic weather and lighting for a scene.
    pub fn generate_environment(&mut self) -> Environment {
        Environment {
            weather: self.rng.pick(WEATHER).to_string(),
            time_of_day: self.rng.pick(TIME_OF_DAY).to_string(),
            atmosphere: self.rng.pick(ATMOSPHERES).to_string(),
            snowfall_intensity: self.rng.next_float(0.3, 1.0),
            wind_speed: self.rng.next_float(0.0, 1.0),
            visibility: self.rng.next_float(0.5, 1.0),
            ambient_light: self.rng.next_float(0.3, 0.8),
        }
    }

    /// Between 5 and 15 decorative sprites.
    pub fn generate_decorations(&mut self) -> Vec<Decoration> {
        let count = self.rng.next_usize(5, 15);
        (0..count)
            .map(|_| Decoration {
                kind: self.rng.pick(DECORATION_KINDS).to_string(),
                x: self.rng.next_float(0.0, 100.0),
                y: self.rng.next_float(0.0, 100.0),
                size: self.rng.next_float(0.5, 2.0),
                rotation: self.rng.next_float(0.0, 360.0),
                opacity: self.rng.next_float(0.3, 1.0),
            })
            .collect()
    }

    /// Wrap an NPC line in a random storyteller's prefix or suffix.
    pub fn vary_dialogue(&mut self, line: &str) -> String {
        if self.rng.next() > 0.5 {
            format!("{}{}", self.rng.pick(DIALOGUE_PREFIXES), line)
        } else {
            format!("{} {}", line, self.rng.pick(DIALOGUE_SUFFIXES))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::caesar_decrypt;

    #[test]
    fn pattern_memory_scales_by_difficulty() {
        let mut generator = ProceduralGenerator::new(1);
        for (d, len, attempts) in [
            (Difficulty::Easy, 4, 5),
            (Difficulty::Medium, 6, 3),
            (Difficulty::Hard, 8, 2),
        ] {
            match generator.generate_variant(Archetype::PatternMemory, d) {
                PuzzleVariant::PatternMemory {
                    pattern,
                    max_attempts,
                    ..
                } => {
                    assert_eq!(pattern.len(), len);
                    assert_eq!(max_attempts, attempts);
                    assert!(pattern.iter().all(|s| PATTERN_SYMBOLS.contains(&s.as_str())));
                }
                other => panic!("unexpected variant {other:?}"),
            }
        }
    }

    #[test]
    fn cipher_hint_by_difficulty() {
        let mut generator = ProceduralGenerator::new(42);
        let easy = generator.generate_variant(Archetype::CipherDecode, Difficulty::Easy);
        let medium = generator.generate_variant(Archetype::CipherDecode, Difficulty::Medium);
        let hard = generator.generate_variant(Archetype::CipherDecode, Difficulty::Hard);
        match easy {
            PuzzleVariant::CipherDecode {
                encrypted,
                original,
                shift,
                hint,
                max_attempts,
            } => {
                assert!((1..=25).contains(&shift));
                assert!(CIPHER_MESSAGES.contains(&original.as_str()));
                assert_eq!(caesar_decrypt(&encrypted, shift), original);
                assert_eq!(hint, Some(format!("Shift by {shift}")));
                assert_eq!(max_attempts, 5);
            }
            other => panic!("unexpected variant {other:?}"),
        }
        assert!(matches!(
            medium,
            PuzzleVariant::CipherDecode { hint: Some(ref h), max_attempts: 3, .. } if h == "Caesar cipher"
        ));
        assert!(matches!(
            hard,
            PuzzleVariant::CipherDecode {
                hint: None,
                max_attempts: 1,
                ..
            }
        ));
    }

    #[test]
    fn memory_sequence_order_is_permutation() {
        let mut generator = ProceduralGenerator::new(8);
        match generator.generate_variant(Archetype::MemorySequence, Difficulty::Hard) {
            PuzzleVariant::MemorySequence {
                fragments,
                correct_order,
                time_limit_ms,
            } => {
                assert_eq!(fragments.len(), 7);
                let mut sorted = correct_order.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, (0..7).collect::<Vec<_>>());
                assert_eq!(time_limit_ms, 30_000);
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn mirror_swaps_direction_and_reverses() {
        let mut generator = ProceduralGenerator::new(5);
        match generator.generate_variant(Archetype::MirrorPuzzle, Difficulty::Hard) {
            PuzzleVariant::MirrorPuzzle {
                original, mirrored, ..
            } => {
                assert_eq!(original.len(), 8);
                assert_eq!(mirrored.len(), 8);
                for (i, symbol) in original.iter().enumerate() {
                    let expected = match symbol.as_str() {
                        "◀" => "▶",
                        "▶" => "◀",
                        s => s,
                    };
                    assert_eq!(mirrored[7 - i], expected);
                }
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn temporal_paradox_correct_follows_shuffle() {
        for seed in 0..20 {
            let mut generator = ProceduralGenerator::new(seed);
            if let PuzzleVariant::TemporalParadox {
                question,
                options,
                correct,
                ..
            } = generator.generate_variant(Archetype::TemporalParadox, Difficulty::Hard)
            {
                let scenario = PARADOX_SCENARIOS
                    .iter()
                    .find(|s| s.question == question)
                    .unwrap();
                assert_eq!(options[correct], scenario.options[scenario.correct]);
            } else {
                panic!("wrong variant");
            }
        }
    }

    #[test]
    fn temporal_paradox_accepts_only_the_remapped_option() {
        for seed in 0..20 {
            let mut generator = ProceduralGenerator::new(seed);
            let variant = generator.generate_variant(Archetype::TemporalParadox, Difficulty::Medium);
            let PuzzleVariant::TemporalParadox {
                options, correct, ..
            } = &variant
            else {
                panic!("wrong variant");
            };
            assert_eq!(variant.check_answer(&options[*correct].to_uppercase()), Some(true));
            for (i, option) in options.iter().enumerate() {
                if option.to_lowercase() != options[*correct].to_lowercase() {
                    assert_eq!(variant.check_answer(option), Some(false), "option {i}");
                }
            }
        }
    }

    #[test]
    fn hard_spatial_pattern_stays_on_a_five_grid() {
        for seed in 0..200 {
            let mut generator = ProceduralGenerator::new(seed);
            let variant = generator.generate_variant(Archetype::SpatialPattern, Difficulty::Hard);
            let PuzzleVariant::SpatialPattern {
                grid, path, size, ..
            } = &variant
            else {
                panic!("wrong variant");
            };
            assert_eq!(*size, 5);
            assert_eq!(grid.len(), 5);
            assert!(path.len() >= 2, "seed {seed}: {path:?}");
            assert_eq!(path[0], (0, 0));
            for (i, &(x, y)) in path.iter().enumerate() {
                assert!(x < 5 && y < 5, "seed {seed}: ({x}, {y})");
                assert_eq!(grid[y][x], i as u32 + 1);
            }
            assert_eq!(variant.check_path(path), Some(true));
        }
    }

    #[test]
    fn generated_sequences_check_against_themselves() {
        let mut generator = ProceduralGenerator::new(17);
        let pattern = generator.generate_variant(Archetype::PatternMemory, Difficulty::Medium);
        if let PuzzleVariant::PatternMemory { pattern: symbols, .. } = &pattern {
            assert_eq!(pattern.check_sequence(symbols), Some(true));
            assert_eq!(pattern.check_sequence(&symbols[1..]), Some(false));
        } else {
            panic!("wrong variant");
        }

        let colors = generator.generate_variant(Archetype::ColorMatching, Difficulty::Easy);
        if let PuzzleVariant::ColorMatching { sequence, .. } = &colors {
            assert_eq!(colors.check_sequence(sequence), Some(true));
        } else {
            panic!("wrong variant");
        }

        let mirror = generator.generate_variant(Archetype::MirrorPuzzle, Difficulty::Medium);
        if let PuzzleVariant::MirrorPuzzle {
            original, mirrored, ..
        } = &mirror
        {
            assert_eq!(mirror.check_sequence(mirrored), Some(true));
            if original != mirrored {
                assert_eq!(mirror.check_sequence(original), Some(false));
            }
        } else {
            panic!("wrong variant");
        }

        let anagram = generator.generate_variant(Archetype::Anagram, Difficulty::Hard);
        if let PuzzleVariant::Anagram { answer, .. } = &anagram {
            assert_eq!(anagram.check_answer(&answer.to_uppercase()), Some(true));
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn math_tolerance_only_on_easy() {
        let mut generator = ProceduralGenerator::new(3);
        let easy = generator.generate_variant(Archetype::MathSequence, Difficulty::Easy);
        let hard = generator.generate_variant(Archetype::MathSequence, Difficulty::Hard);
        assert!(matches!(easy, PuzzleVariant::MathSequence { tolerance: 1, hint: Some(_), .. }));
        assert!(matches!(hard, PuzzleVariant::MathSequence { tolerance: 0, hint: None, .. }));
    }

    #[test]
    fn symbol_substitution_key_on_easy_only() {
        let mut generator = ProceduralGenerator::new(12);
        match generator.generate_variant(Archetype::SymbolSubstitution, Difficulty::Easy) {
            PuzzleVariant::SymbolSubstitution {
                symbol_word,
                answer,
                key,
                ..
            } => {
                assert!(["fire", "star", "tree"].contains(&answer.as_str()));
                assert_eq!(key.map(|k| k.len()), Some(8));
                assert!(symbol_word.contains("🔥") || symbol_word.contains("❄️") || symbol_word.contains("⭐"));
            }
            other => panic!("unexpected variant {other:?}"),
        }
        let hard = generator.generate_variant(Archetype::SymbolSubstitution, Difficulty::Hard);
        assert!(matches!(hard, PuzzleVariant::SymbolSubstitution { key: None, .. }));
    }

    #[test]
    fn anagram_scrambles_same_letters() {
        let mut generator = ProceduralGenerator::new(21);
        match generator.generate_variant(Archetype::Anagram, Difficulty::Easy) {
            PuzzleVariant::Anagram {
                scrambled,
                answer,
                hint,
                ..
            } => {
                let mut a: Vec<char> = scrambled.to_lowercase().chars().collect();
                let mut b: Vec<char> = answer.chars().collect();
                a.sort_unstable();
                b.sort_unstable();
                assert_eq!(a, b);
                assert_eq!(hint, Some(format!("{} letters", answer.len())));
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }

    #[test]
    fn narrative_archetypes_scale_cosmetics() {
        let mut generator = ProceduralGenerator::new(0);
        assert_eq!(
            generator.generate_variant(Archetype::FinalChoice, Difficulty::Easy),
            PuzzleVariant::FinalChoice {
                time_to_decide_ms: None,
                show_consequences: true,
                allow_undo: true,
            }
        );
        assert_eq!(
            generator.generate_variant(Archetype::DialogueTree, Difficulty::Hard),
            PuzzleVariant::DialogueTree { max_depth: 4 }
        );
        assert_eq!(
            generator.generate_variant(Archetype::TrustCoordination, Difficulty::Hard),
            PuzzleVariant::TrustCoordination {
                failure_consequence: "severe".to_string()
            }
        );
    }

    #[test]
    fn narrative_archetypes_do_not_consume_randomness() {
        let mut a = ProceduralGenerator::new(77);
        let mut b = ProceduralGenerator::new(77);
        a.generate_variant(Archetype::MoralChoice, Difficulty::Medium);
        a.generate_variant(Archetype::TimelineMapping, Difficulty::Hard);
        assert_eq!(
            a.generate_variant(Archetype::CipherDecode, Difficulty::Hard),
            b.generate_variant(Archetype::CipherDecode, Difficulty::Hard)
        );
    }

    #[test]
    fn unknown_tags_fall_back() {
        let mut a = ProceduralGenerator::new(9);
        let mut b = ProceduralGenerator::new(9);
        assert_eq!(
            a.generate_for_tags("moral-judgment", "impossible"),
            b.generate_variant(Archetype::PatternMemory, Difficulty::Medium)
        );
    }

    #[test]
    fn environment_ranges() {
        let mut generator = ProceduralGenerator::new(4);
        let env = generator.generate_environment();
        assert!(WEATHER.contains(&env.weather.as_str()));
        assert!((0.3..1.0).contains(&env.snowfall_intensity));
        assert!((0.5..1.0).contains(&env.visibility));
        let decorations = generator.generate_decorations();
        assert!((5..=15).contains(&decorations.len()));
        assert!(decorations.iter().all(|d| (0.3..1.0).contains(&d.opacity)));
    }

    #[test]
    fn dialogue_variation_keeps_line() {
        let mut generator = ProceduralGenerator::new(10);
        for _ in 0..10 {
            let line = generator.vary_dialogue("The flame remembers");
            assert!(line.contains("The flame remembers"));
            assert_ne!(line, "The flame remembers");
        }
    }
}
