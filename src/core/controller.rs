//! Game controller: drives a playthrough through the content table.
//!
//! Wires the progression state, procedural generator, hint system and
//! timers to external presentation collaborators. Screen flow is an
//! explicit [`Phase`]; delayed steps run from [`GameController::tick`].

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

use crate::core::clock::{Clock, Scheduler, SystemClock};
use crate::core::generator::ProceduralGenerator;
use crate::core::hints::{HintResponse, HintSystem};
use crate::core::persistence::{KeyValueStore, MemoryStore, PersistenceGateway};
use crate::core::progression::ProgressionState;
use crate::schema::choice::{Choice, Item};
use crate::schema::difficulty::{Difficulty, Position, Role};
use crate::schema::narrative::{Chapter, ContentError, Ending, EndingKey, Level, NarrativeTable};
use crate::schema::puzzle::PuzzleVariant;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("no game in progress")]
    NotStarted,
    #[error("chapter not found: {0}")]
    ChapterNotFound(u8),
    #[error("level not found: chapter {0}, level {1}")]
    LevelNotFound(u8, u8),
    #[error("no choice at index {0}")]
    NoSuchChoice(usize),
    #[error("action not valid during {0:?}")]
    WrongPhase(Phase),
}

/// Tunables, loadable from RON. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub save_key: String,
    pub auto_save_interval_ms: u64,
    pub base_puzzle_kindling: u32,
    pub chapter_count: u8,
    pub levels_per_chapter: u8,
    pub chapter_load_delay_ms: u64,
    pub narrative_ms_per_char: u64,
    pub narrative_base_delay_ms: u64,
    pub choice_delay_ms: u64,
    pub hint_cooldown_base_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            save_key: "winterKindling_save".to_string(),
            auto_save_interval_ms: 120_000,
            base_puzzle_kindling: 20,
            chapter_count: 5,
            levels_per_chapter: 3,
            chapter_load_delay_ms: 1_000,
            narrative_ms_per_char: 30,
            narrative_base_delay_ms: 1_000,
            choice_delay_ms: 2_000,
            hint_cooldown_base_ms: 30_000,
        }
    }
}

impl GameSettings {
    pub fn load_from_ron(path: &Path) -> Result<GameSettings, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<GameSettings, ContentError> {
        Ok(ron::from_str(input)?)
    }
}

/// Which screen the game is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    /// Waiting for the first chapter to load after starting.
    Loading,
    ChapterIntro(u8),
    /// Narrative shown, puzzle not yet revealed.
    Level,
    Puzzle,
    Completion { success: bool },
    /// Revelation shown before the given chapter loads.
    Twist(u8),
    Ending(EndingKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    pub success: bool,
    pub message: &'static str,
    pub kindling_awarded: u32,
    pub time_ms: u64,
    pub attempts: u32,
    pub is_chapter_end: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JourneyStats {
    pub kindling: u32,
    pub choices: usize,
    pub items: usize,
    pub achievements: usize,
}

/// Displays a generated puzzle and later reports the outcome through
/// [`GameController::complete_puzzle`] or [`GameController::submit_answer`].
pub trait PuzzleRenderer {
    fn show_puzzle(&mut self, _variant: &PuzzleVariant) {}
    fn clear(&mut self) {}
}

/// Screens and notifications. Every method defaults to doing nothing.
pub trait Presenter {
    fn chapter_intro(&mut self, _chapter: &Chapter, _role: Role) {}
    fn level(&mut self, _position: Position, _level: &Level) {}
    fn choices(&mut self, _choices: &[Choice]) {}
    fn completion(&mut self, _summary: &CompletionSummary) {}
    fn twist(&mut self, _chapter: &Chapter, _text: &str) {}
    fn ending(&mut self, _key: EndingKey, _ending: Option<&Ending>, _stats: &JourneyStats) {}
    fn notify(&mut self, _message: &str, _level: NoticeLevel) {}
}

#[derive(Debug, Default)]
pub struct NullRenderer;
impl PuzzleRenderer for NullRenderer {}

#[derive(Debug, Default)]
pub struct NullPresenter;
impl Presenter for NullPresenter {}

const SUCCESS_MESSAGE: &str = "The path forward is clear...";
const FAILURE_MESSAGE: &str = "The cold claims another attempt...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    LoadChapter(u8),
    ShowPuzzle,
    ShowChoices,
}

pub struct GameController {
    table: Rc<NarrativeTable>,
    settings: GameSettings,
    clock: Rc<dyn Clock>,
    state: ProgressionState,
    hints: HintSystem,
    generator: Option<ProceduralGenerator>,
    timers: Scheduler<Pending>,
    renderer: Box<dyn PuzzleRenderer>,
    presenter: Box<dyn Presenter>,
    phase: Phase,
    variant: Option<PuzzleVariant>,
    level_started_at: u64,
    attempts: u32,
    choices_offered: bool,
    choice_made: bool,
}

pub struct GameControllerBuilder {
    narrative: Option<NarrativeTable>,
    narrative_path: Option<PathBuf>,
    settings: GameSettings,
    store: Option<Rc<dyn KeyValueStore>>,
    clock: Option<Rc<dyn Clock>>,
    renderer: Option<Box<dyn PuzzleRenderer>>,
    presenter: Option<Box<dyn Presenter>>,
}

impl GameControllerBuilder {
    /// Use an already-loaded content table.
    pub fn narrative(mut self, table: NarrativeTable) -> Self {
        self.narrative = Some(table);
        self
    }

    /// Load the content table from a RON file at build time.
    pub fn narrative_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.narrative_path = Some(path.into());
        self
    }

    pub fn settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(mut self, store: Rc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn renderer(mut self, renderer: Box<dyn PuzzleRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn build(self) -> Result<GameController, ControllerError> {
        let table = match (self.narrative, self.narrative_path) {
            (Some(table), _) => table,
            (None, Some(path)) => NarrativeTable::load_from_ron(&path)?,
            (None, None) => {
                return Err(ContentError::Invalid("no narrative table provided".to_string()).into())
            }
        };
        let settings = self.settings;
        let clock = self
            .clock
            .unwrap_or_else(|| Rc::new(SystemClock) as Rc<dyn Clock>);
        let store = self
            .store
            .unwrap_or_else(|| Rc::new(MemoryStore::new()) as Rc<dyn KeyValueStore>);

        let gateway = PersistenceGateway::new(store, settings.save_key.clone());
        let state = ProgressionState::new(gateway, Rc::clone(&clock))
            .with_auto_save_interval(settings.auto_save_interval_ms)
            .with_levels_per_chapter(settings.levels_per_chapter);
        let hints = HintSystem::with_base_cooldown(table.hints.clone(), settings.hint_cooldown_base_ms);

        Ok(GameController {
            table: Rc::new(table),
            settings,
            clock,
            state,
            hints,
            generator: None,
            timers: Scheduler::new(),
            renderer: self
                .renderer
                .unwrap_or_else(|| Box::new(NullRenderer) as Box<dyn PuzzleRenderer>),
            presenter: self
                .presenter
                .unwrap_or_else(|| Box::new(NullPresenter) as Box<dyn Presenter>),
            phase: Phase::Menu,
            variant: None,
            level_started_at: 0,
            attempts: 0,
            choices_offered: false,
            choice_made: false,
        })
    }
}

impl GameController {
    pub fn builder() -> GameControllerBuilder {
        GameControllerBuilder {
            narrative: None,
            narrative_path: None,
            settings: GameSettings::default(),
            store: None,
            clock: None,
            renderer: None,
            presenter: None,
        }
    }

    // --- accessors ---

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ProgressionState {
        &mut self.state
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn table(&self) -> &NarrativeTable {
        &self.table
    }

    pub fn generator(&self) -> Option<&ProceduralGenerator> {
        self.generator.as_ref()
    }

    pub fn generator_mut(&mut self) -> Option<&mut ProceduralGenerator> {
        self.generator.as_mut()
    }

    /// The puzzle currently on screen, if any.
    pub fn current_variant(&self) -> Option<&PuzzleVariant> {
        self.variant.as_ref()
    }

    pub fn current_level(&self) -> Option<&Level> {
        let role = self.state.role()?;
        self.table.level(role, self.state.position())
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// When the next delayed step is due.
    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn stats(&self) -> JourneyStats {
        let data = self.state.data();
        JourneyStats {
            kindling: data.kindling_points,
            choices: data.choices.len(),
            items: data.inventory.len(),
            achievements: data.achievements.len(),
        }
    }

    // --- flow ---

    /// Begin a new playthrough. With `seed: None` a fresh seed is derived
    /// from the clock. Returns the seed in use.
    pub fn start_game(
        &mut self,
        role: Role,
        player_number: u8,
        difficulty: Difficulty,
        seed: Option<u32>,
    ) -> u32 {
        self.clear_level();
        self.hints.reset();
        let seed = match seed {
            Some(seed) => {
                self.state
                    .initialize_game_with_seed(role, player_number, difficulty, seed);
                seed
            }
            None => self.state.initialize_game(role, player_number, difficulty),
        };
        info!("starting game as {role} (player {player_number}) on {}", difficulty.tag());
        self.generator = Some(ProceduralGenerator::new(seed));
        self.phase = Phase::Loading;
        let now = self.clock.now_ms();
        self.timers
            .schedule(now, self.settings.chapter_load_delay_ms, Pending::LoadChapter(1));
        seed
    }

    /// Run every delayed step that has fallen due, then the auto-save.
    /// Returns the number of steps run.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now_ms();
        let due = self.timers.poll(now);
        let count = due.len();
        for (_, pending) in due {
            debug!("timer fired: {pending:?}");
            let result = match pending {
                Pending::LoadChapter(chapter) => self.load_chapter(chapter),
                Pending::ShowPuzzle => self.load_puzzle(),
                Pending::ShowChoices => {
                    self.offer_choices();
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!("delayed step {pending:?} failed: {e}");
            }
        }
        self.state.poll_auto_save();
        count
    }

    /// Advance past the current screen: chapter intro, twist, completion,
    /// a narrative puzzle, or the ending.
    pub fn confirm(&mut self) -> Result<(), ControllerError> {
        match self.phase {
            Phase::ChapterIntro(chapter) => self.load_level(Position::new(chapter, 1)),
            Phase::Twist(chapter) => self.load_chapter(chapter),
            Phase::Completion { success: true } => self.progress_to_next(),
            Phase::Completion { success: false } => self.restart_level(),
            Phase::Puzzle
                if self
                    .variant
                    .as_ref()
                    .is_some_and(|v| v.archetype().is_narrative()) =>
            {
                self.complete_puzzle(true).map(|_| ())
            }
            Phase::Ending(_) => {
                self.return_to_menu();
                Ok(())
            }
            phase => Err(ControllerError::WrongPhase(phase)),
        }
    }

    fn load_chapter(&mut self, number: u8) -> Result<(), ControllerError> {
        let role = self.state.role().ok_or(ControllerError::NotStarted)?;
        let table = Rc::clone(&self.table);
        let Some(chapter) = table.chapter(number) else {
            error!("chapter not found: {number}");
            return Err(ControllerError::ChapterNotFound(number));
        };
        info!("loading chapter {number}: {}", chapter.title);
        self.phase = Phase::ChapterIntro(number);
        self.presenter.chapter_intro(chapter, role);
        Ok(())
    }

    fn load_level(&mut self, position: Position) -> Result<(), ControllerError> {
        let role = self.state.role().ok_or(ControllerError::NotStarted)?;
        let table = Rc::clone(&self.table);
        let Some(level) = table.level(role, position) else {
            error!("level not found: {}", position.level_key());
            return Err(ControllerError::LevelNotFound(position.chapter, position.level));
        };
        info!("loading level {}: {}", position.level_key(), level.title);

        self.clear_level();
        self.hints.reset_level();
        let now = self.clock.now_ms();
        self.level_started_at = now;
        self.state.set_position(position);
        self.phase = Phase::Level;
        self.presenter.level(position, level);

        let delay = level.narrative.chars().count() as u64 * self.settings.narrative_ms_per_char
            + self.settings.narrative_base_delay_ms;
        self.timers.schedule(now, delay, Pending::ShowPuzzle);
        Ok(())
    }

    fn load_puzzle(&mut self) -> Result<(), ControllerError> {
        let difficulty = self.state.difficulty();
        let (archetype, has_choices) = {
            let level = self.current_level().ok_or(ControllerError::NotStarted)?;
            (level.archetype(), !level.choices.is_empty())
        };
        let generator = self.generator.as_mut().ok_or(ControllerError::NotStarted)?;
        let variant = generator.generate_variant(archetype, difficulty);
        debug!("generated puzzle: {variant:?}");

        self.renderer.show_puzzle(&variant);
        self.variant = Some(variant);
        self.attempts = 0;
        self.phase = Phase::Puzzle;

        if has_choices {
            let now = self.clock.now_ms();
            self.timers
                .schedule(now, self.settings.choice_delay_ms, Pending::ShowChoices);
        }
        Ok(())
    }

    fn offer_choices(&mut self) {
        let table = Rc::clone(&self.table);
        let Some(level) = self
            .state
            .role()
            .and_then(|role| table.level(role, self.state.position()))
        else {
            return;
        };
        self.choices_offered = true;
        self.presenter.choices(&level.choices);
    }

    /// Choices on offer at the current level, once they have been shown.
    pub fn available_choices(&self) -> &[Choice] {
        match self.current_level() {
            Some(level) if self.choices_offered && !self.choice_made => &level.choices,
            _ => &[],
        }
    }

    /// Take one of the current level's choices. One choice per level visit.
    pub fn choose(&mut self, index: usize) -> Result<Choice, ControllerError> {
        if !self.choices_offered || self.choice_made {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        let choice = self
            .current_level()
            .ok_or(ControllerError::NotStarted)?
            .choices
            .get(index)
            .cloned()
            .ok_or(ControllerError::NoSuchChoice(index))?;

        info!("player chose: {}", choice.text);
        self.choice_made = true;
        self.state.record_choice(choice.clone());
        if choice.kindling > 0 {
            self.state.add_kindling(choice.kindling);
        }
        self.presenter.notify(
            &format!("Choice recorded: {}", choice.consequence),
            NoticeLevel::Info,
        );
        Ok(choice)
    }

    /// Check a typed answer against the current puzzle. A correct answer
    /// completes it; running out of attempts fails it. Returns `None` when
    /// the puzzle is not answered with text.
    pub fn submit_answer(&mut self, answer: &str) -> Result<Option<bool>, ControllerError> {
        if self.phase != Phase::Puzzle {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        let Some(variant) = self.variant.as_ref() else {
            return Err(ControllerError::WrongPhase(self.phase));
        };
        let Some(correct) = variant.check_answer(answer) else {
            return Ok(None);
        };
        let max_attempts = variant.max_attempts();
        self.attempts += 1;
        if correct {
            self.complete_puzzle(true)?;
        } else if max_attempts.is_some_and(|max| self.attempts >= max) {
            self.complete_puzzle(false)?;
        }
        Ok(Some(correct))
    }

    /// Report the puzzle outcome. Success awards kindling scaled by
    /// difficulty and the level's items.
    pub fn complete_puzzle(&mut self, success: bool) -> Result<CompletionSummary, ControllerError> {
        if self.phase != Phase::Puzzle {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        let now = self.clock.now_ms();
        let time_ms = now.saturating_sub(self.level_started_at);
        let position = self.state.position();

        let mut kindling_awarded = 0;
        if success {
            let complexity = self.state.modifiers().puzzle_complexity;
            kindling_awarded =
                (f64::from(self.settings.base_puzzle_kindling) * complexity).floor() as u32;
            self.state.add_kindling(kindling_awarded);

            let table = Rc::clone(&self.table);
            if let Some(level) = self.current_level().cloned() {
                for name in &level.items {
                    self.state.add_item(Item::new(name, table.item_icon(name)));
                }
            }
            self.state.record_level_time(time_ms);
        }

        let summary = CompletionSummary {
            success,
            message: if success { SUCCESS_MESSAGE } else { FAILURE_MESSAGE },
            kindling_awarded,
            time_ms,
            attempts: self.attempts.max(1),
            is_chapter_end: position.level >= self.settings.levels_per_chapter,
        };
        self.renderer.clear();
        self.phase = Phase::Completion { success };
        self.presenter.completion(&summary);
        Ok(summary)
    }

    fn progress_to_next(&mut self) -> Result<(), ControllerError> {
        let next = self.state.next_position();
        if next.chapter <= self.settings.chapter_count {
            let role = self.state.role().ok_or(ControllerError::NotStarted)?;
            if self.table.chapter(next.chapter).is_none() {
                error!("cannot advance: chapter not found: {}", next.chapter);
                return Err(ControllerError::ChapterNotFound(next.chapter));
            }
            if self.table.level(role, next).is_none() {
                error!("cannot advance: level not found: {}", next.level_key());
                return Err(ControllerError::LevelNotFound(next.chapter, next.level));
            }
        }

        let step = self.state.advance();
        if self.state.is_complete(self.settings.chapter_count) {
            self.show_ending();
            return Ok(());
        }
        if step.chapter_completed.is_none() {
            return self.load_level(step.to);
        }

        let table = Rc::clone(&self.table);
        let chapter = table
            .chapter(step.to.chapter)
            .ok_or(ControllerError::ChapterNotFound(step.to.chapter))?;
        match &chapter.twist {
            Some(twist) => {
                info!("twist before chapter {}", step.to.chapter);
                self.clear_level();
                self.phase = Phase::Twist(step.to.chapter);
                self.presenter.twist(chapter, twist);
                Ok(())
            }
            None => self.load_chapter(step.to.chapter),
        }
    }

    fn show_ending(&mut self) {
        self.clear_level();
        let key = self.state.resolve_ending();
        self.state.unlock_ending(key);
        let table = Rc::clone(&self.table);
        let ending = table
            .ending(key)
            .or_else(|| table.ending(EndingKey::GratitudeEnding));
        info!(
            "game ending: {}",
            ending.map(|e| e.title.as_str()).unwrap_or(key.tag())
        );
        let stats = self.stats();
        self.phase = Phase::Ending(key);
        self.presenter.ending(key, ending, &stats);
    }

    /// Reload the current level with a fresh puzzle.
    pub fn restart_level(&mut self) -> Result<(), ControllerError> {
        self.load_level(self.state.position())
    }

    pub fn save_game(&mut self) -> bool {
        let saved = self.state.save();
        if saved {
            self.presenter
                .notify("Game saved successfully!", NoticeLevel::Success);
        } else {
            self.presenter.notify("Failed to save game", NoticeLevel::Error);
        }
        saved
    }

    /// Restore the saved playthrough and reload its current level. The
    /// generator restarts from the saved seed.
    pub fn load_game(&mut self) -> bool {
        if !self.state.load() {
            self.presenter.notify("No saved game found", NoticeLevel::Error);
            return false;
        }
        let seed = self.state.seed().unwrap_or_else(|| {
            warn!("save has no seed; deriving a new one");
            crate::core::progression::derive_seed(self.clock.now_ms())
        });
        self.generator = Some(ProceduralGenerator::new(seed));
        self.state.start_auto_save();
        self.presenter.notify("Game loaded!", NoticeLevel::Success);
        if let Err(e) = self.restart_level() {
            warn!("could not resume loaded game: {e}");
        }
        true
    }

    pub fn request_hint(&mut self) -> HintResponse {
        let archetype = self.variant.as_ref().map(PuzzleVariant::archetype);
        let response = self.hints.request(&mut self.state, archetype);
        match &response {
            HintResponse::Hint { text, .. } => self.presenter.notify(text, NoticeLevel::Info),
            HintResponse::Cooldown { message, .. } => {
                self.presenter.notify(message, NoticeLevel::Warning)
            }
        }
        response
    }

    /// Abandon the playthrough and go back to the menu.
    pub fn return_to_menu(&mut self) {
        self.clear_level();
        self.timers.cancel_all();
        self.hints.reset();
        self.state.reset();
        self.generator = None;
        self.phase = Phase::Menu;
    }

    /// Cancel level timers and forget the current puzzle.
    fn clear_level(&mut self) {
        self.timers.cancel_all();
        self.variant = None;
        self.attempts = 0;
        self.choices_offered = false;
        self.choice_made = false;
    }
}

impl std::fmt::Debug for GameController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("pending_timers", &self.timers.pending())
            .finish()
    }
}
