//! WASM bindings for winter-kindling, driving the browser build of the game.
//!
//! The host page owns real time: it passes `performance.now()`-style
//! milliseconds into [`WinterKindlingGame::tick`], and everything the game
//! wants to show is queued as JSON screens for the page to drain.

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use winter_kindling::core::clock::ManualClock;
use winter_kindling::core::controller::{
    CompletionSummary, GameController, JourneyStats, NoticeLevel, Phase, Presenter, PuzzleRenderer,
};
use winter_kindling::core::generator::ProceduralGenerator;
use winter_kindling::core::hints::HintResponse;
use winter_kindling::core::persistence::{KeyValueStore, MemoryStore};
use winter_kindling::schema::choice::Choice;
use winter_kindling::schema::difficulty::{Difficulty, Position, Role};
use winter_kindling::schema::narrative::{Chapter, Ending, EndingKey, Level, NarrativeTable};
use winter_kindling::schema::puzzle::PuzzleVariant;

// ---------------------------------------------------------------------------
// Embedded content, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const NARRATIVE: &str = include_str!("../../content/winter_kindling.ron");
}

const SAVE_KEY: &str = "winterKindling_save";

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
enum Screen {
    ChapterIntro {
        chapter: u8,
        title: String,
        description: String,
        setting: String,
        intro: String,
    },
    Level {
        position: Position,
        title: String,
        narrative: String,
        objective: String,
    },
    Puzzle {
        variant: PuzzleVariant,
    },
    Choices {
        choices: Vec<Choice>,
    },
    Completion {
        success: bool,
        message: String,
        kindling: u32,
        time_ms: u64,
        attempts: u32,
        chapter_end: bool,
    },
    Twist {
        chapter: u8,
        text: String,
    },
    Ending {
        key: EndingKey,
        title: String,
        narrative: String,
        epilogue: String,
        kindling: u32,
        choices: usize,
        items: usize,
        achievements: usize,
    },
    Notice {
        message: String,
        level: &'static str,
    },
}

#[derive(serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum HintOutput {
    Hint { text: String, used: u32, cooldown_ms: u64 },
    Cooldown { message: String, remaining_ms: u64 },
}

type ScreenQueue = Rc<RefCell<Vec<Screen>>>;

struct QueuePresenter {
    queue: ScreenQueue,
}

impl QueuePresenter {
    fn push(&self, screen: Screen) {
        self.queue.borrow_mut().push(screen);
    }
}

impl Presenter for QueuePresenter {
    fn chapter_intro(&mut self, chapter: &Chapter, role: Role) {
        self.push(Screen::ChapterIntro {
            chapter: chapter.id,
            title: chapter.title.clone(),
            description: chapter.description.clone(),
            setting: chapter.setting.clone(),
            intro: chapter.branch(role).intro.clone(),
        });
    }

    fn level(&mut self, position: Position, level: &Level) {
        self.push(Screen::Level {
            position,
            title: level.title.clone(),
            narrative: level.narrative.clone(),
            objective: level.objective.clone(),
        });
    }

    fn choices(&mut self, choices: &[Choice]) {
        self.push(Screen::Choices {
            choices: choices.to_vec(),
        });
    }

    fn completion(&mut self, summary: &CompletionSummary) {
        self.push(Screen::Completion {
            success: summary.success,
            message: summary.message.to_string(),
            kindling: summary.kindling_awarded,
            time_ms: summary.time_ms,
            attempts: summary.attempts,
            chapter_end: summary.is_chapter_end,
        });
    }

    fn twist(&mut self, chapter: &Chapter, text: &str) {
        self.push(Screen::Twist {
            chapter: chapter.id,
            text: text.to_string(),
        });
    }

    fn ending(&mut self, key: EndingKey, ending: Option<&Ending>, stats: &JourneyStats) {
        self.push(Screen::Ending {
            key,
            title: ending.map(|e| e.title.clone()).unwrap_or_default(),
            narrative: ending.map(|e| e.narrative.clone()).unwrap_or_default(),
            epilogue: ending.map(|e| e.epilogue.clone()).unwrap_or_default(),
            kindling: stats.kindling,
            choices: stats.choices,
            items: stats.items,
            achievements: stats.achievements,
        });
    }

    fn notify(&mut self, message: &str, level: NoticeLevel) {
        self.push(Screen::Notice {
            message: message.to_string(),
            level: notice_label(level),
        });
    }
}

struct QueueRenderer {
    queue: ScreenQueue,
}

impl PuzzleRenderer for QueueRenderer {
    fn show_puzzle(&mut self, variant: &PuzzleVariant) {
        self.queue.borrow_mut().push(Screen::Puzzle {
            variant: variant.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn notice_label(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "success",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    }
}

fn phase_label(phase: Phase) -> String {
    match phase {
        Phase::Menu => "menu".to_string(),
        Phase::Loading => "loading".to_string(),
        Phase::ChapterIntro(chapter) => format!("chapter_intro:{chapter}"),
        Phase::Level => "level".to_string(),
        Phase::Puzzle => "puzzle".to_string(),
        Phase::Completion { success } => format!("completion:{success}"),
        Phase::Twist(chapter) => format!("twist:{chapter}"),
        Phase::Ending(key) => format!("ending:{key}"),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// WinterKindlingGame, the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct WinterKindlingGame {
    controller: GameController,
    clock: ManualClock,
    store: Rc<MemoryStore>,
    screens: ScreenQueue,
}

#[wasm_bindgen]
impl WinterKindlingGame {
    /// Create a game on the embedded content table. `now_ms` seeds the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(now_ms: f64) -> Result<WinterKindlingGame, JsError> {
        let table = NarrativeTable::parse_ron(data::NARRATIVE)
            .map_err(|e| JsError::new(&format!("Content parse error: {e}")))?;
        let clock = ManualClock::new(now_ms as u64);
        let store = Rc::new(MemoryStore::new());
        let screens: ScreenQueue = Rc::default();

        let controller = GameController::builder()
            .narrative(table)
            .store(Rc::clone(&store) as Rc<dyn KeyValueStore>)
            .clock(Rc::new(clock.clone()))
            .presenter(Box::new(QueuePresenter {
                queue: Rc::clone(&screens),
            }))
            .renderer(Box::new(QueueRenderer {
                queue: Rc::clone(&screens),
            }))
            .build()
            .map_err(|e| JsError::new(&format!("Controller build error: {e}")))?;

        Ok(WinterKindlingGame {
            controller,
            clock,
            store,
            screens,
        })
    }

    /// Start a playthrough. A negative seed derives a fresh one. Returns
    /// the seed in use.
    pub fn start(&mut self, role: &str, player_number: u8, difficulty: &str, seed: f64) -> Result<u32, JsError> {
        let role = Role::from_tag(role).ok_or_else(|| JsError::new(&format!("Unknown role: {role}")))?;
        let seed = (seed >= 0.0).then_some(seed as u32);
        Ok(self
            .controller
            .start_game(role, player_number, Difficulty::from_tag(difficulty), seed))
    }

    /// Move the clock to `now_ms` and run everything that has fallen due.
    pub fn tick(&mut self, now_ms: f64) -> usize {
        self.clock.set(now_ms as u64);
        self.controller.tick()
    }

    pub fn confirm(&mut self) -> Result<(), JsError> {
        self.controller
            .confirm()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Take a choice. Returns the choice as JSON.
    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        let choice = self
            .controller
            .choose(index)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&choice)
    }

    /// Returns `true`/`false` for text puzzles, `null` for the others.
    pub fn submit_answer(&mut self, answer: &str) -> Result<String, JsError> {
        let result = self
            .controller
            .submit_answer(answer)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&result)
    }

    /// Report the outcome of a puzzle solved on the page.
    pub fn complete_puzzle(&mut self, success: bool) -> Result<(), JsError> {
        self.controller
            .complete_puzzle(success)
            .map(|_| ())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn restart_level(&mut self) -> Result<(), JsError> {
        self.controller
            .restart_level()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn request_hint(&mut self) -> Result<String, JsError> {
        let output = match self.controller.request_hint() {
            HintResponse::Hint {
                text,
                used_this_level,
                cooldown_ms,
            } => HintOutput::Hint {
                text,
                used: used_this_level,
                cooldown_ms,
            },
            HintResponse::Cooldown {
                message,
                remaining_ms,
            } => HintOutput::Cooldown {
                message: message.to_string(),
                remaining_ms,
            },
        };
        to_json(&output)
    }

    pub fn phase(&self) -> String {
        phase_label(self.controller.phase())
    }

    /// The full playthrough record as JSON.
    pub fn state(&self) -> Result<String, JsError> {
        to_json(self.controller.state().data())
    }

    /// Screens queued since the last call, as a JSON array.
    pub fn drain_screens(&mut self) -> Result<String, JsError> {
        let screens: Vec<Screen> = self.screens.borrow_mut().drain(..).collect();
        to_json(&screens)
    }

    pub fn save(&mut self) -> bool {
        self.controller.save_game()
    }

    pub fn load(&mut self) -> bool {
        self.controller.load_game()
    }

    /// The stored save file, for the page to keep in localStorage.
    pub fn export_save(&self) -> Option<String> {
        self.store.get(SAVE_KEY).ok().flatten()
    }

    /// Put a save file previously returned by `export_save` back in place.
    pub fn import_save(&mut self, json: &str) -> Result<(), JsError> {
        self.store
            .set(SAVE_KEY, json)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn return_to_menu(&mut self) {
        self.controller.return_to_menu();
    }

    /// Generate one puzzle outside a playthrough. Returns the variant as JSON.
    pub fn preview_puzzle(archetype: &str, difficulty: &str, seed: u32) -> Result<String, JsError> {
        let mut generator = ProceduralGenerator::new(seed);
        to_json(&generator.generate_for_tags(archetype, difficulty))
    }
}
