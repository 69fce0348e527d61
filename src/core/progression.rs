//! Authoritative playthrough state and its mutation operations.
//!
//! `ProgressionState` owns the serializable [`PlaythroughData`], an
//! [`EventBus`], the save gateway and the auto-save timer. Every mutator
//! applies its change in full before notifying listeners.

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::core::achievements::{self, AchievementId};
use crate::core::clock::{Clock, Scheduler, TimerHandle};
use crate::core::ending::resolve_ending;
use crate::core::events::{EventBus, EventKind, GameEvent, ListenerId};
use crate::core::persistence::PersistenceGateway;
use crate::schema::choice::{Choice, ChoiceRecord, Item};
use crate::schema::difficulty::{Difficulty, DifficultyModifiers, Position, Role};
use crate::schema::narrative::EndingKey;

/// Default interval between automatic saves.
pub const DEFAULT_AUTO_SAVE_MS: u64 = 120_000;

/// Everything persisted for one playthrough. Absent fields deserialize to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaythroughData {
    pub role: Option<Role>,
    pub player_number: Option<u8>,
    pub difficulty: Option<Difficulty>,
    pub position: Position,
    pub kindling_points: u32,
    pub inventory: Vec<Item>,
    pub choices: Vec<ChoiceRecord>,
    /// Keys of the form `ch{chapter}-lv{level}`.
    pub completed_levels: Vec<String>,
    pub game_start_time: Option<u64>,
    pub total_play_time: u64,
    pub hints_used: u32,
    pub seed: Option<u32>,
    pub unlocked_endings: Vec<EndingKey>,
    pub achievements: Vec<AchievementId>,
    pub fastest_level_ms: Option<u64>,
}

/// Outcome of [`ProgressionState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub from: Position,
    pub to: Position,
    /// The chapter that was just finished, if the level index wrapped.
    pub chapter_completed: Option<u8>,
}

/// Derive a playthrough seed from wall-clock time plus up to a million of
/// random jitter, truncated to 32 bits.
pub fn derive_seed(now_ms: u64) -> u32 {
    let jitter: u64 = rand::thread_rng().gen_range(0..1_000_000);
    now_ms.wrapping_add(jitter) as u32
}

pub struct ProgressionState {
    data: PlaythroughData,
    events: EventBus,
    clock: Rc<dyn Clock>,
    gateway: PersistenceGateway,
    auto_save: Scheduler<()>,
    auto_save_timer: Option<TimerHandle>,
    auto_save_interval_ms: u64,
    levels_per_chapter: u8,
}

impl ProgressionState {
    pub fn new(gateway: PersistenceGateway, clock: Rc<dyn Clock>) -> Self {
        Self {
            data: PlaythroughData::default(),
            events: EventBus::new(),
            clock,
            gateway,
            auto_save: Scheduler::new(),
            auto_save_timer: None,
            auto_save_interval_ms: DEFAULT_AUTO_SAVE_MS,
            levels_per_chapter: 3,
        }
    }

    pub fn with_auto_save_interval(mut self, interval_ms: u64) -> Self {
        self.auto_save_interval_ms = interval_ms;
        self
    }

    pub fn with_levels_per_chapter(mut self, levels: u8) -> Self {
        self.levels_per_chapter = levels.max(1);
        self
    }

    // --- accessors ---

    pub fn data(&self) -> &PlaythroughData {
        &self.data
    }

    pub fn role(&self) -> Option<Role> {
        self.data.role
    }

    /// Chosen difficulty, medium before a game starts.
    pub fn difficulty(&self) -> Difficulty {
        self.data.difficulty.unwrap_or_default()
    }

    pub fn position(&self) -> Position {
        self.data.position
    }

    pub fn seed(&self) -> Option<u32> {
        self.data.seed
    }

    pub fn kindling(&self) -> u32 {
        self.data.kindling_points
    }

    pub fn is_started(&self) -> bool {
        self.data.role.is_some()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.events.on(kind, listener)
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.emit(&event);
    }

    // --- lifecycle ---

    /// Start a playthrough with a fresh, non-reproducible seed.
    pub fn initialize_game(&mut self, role: Role, player_number: u8, difficulty: Difficulty) -> u32 {
        let seed = derive_seed(self.clock.now_ms());
        self.initialize_game_with_seed(role, player_number, difficulty, seed);
        seed
    }

    /// Start a playthrough with a caller-chosen seed. Calling this on a
    /// running game resets it first.
    pub fn initialize_game_with_seed(
        &mut self,
        role: Role,
        player_number: u8,
        difficulty: Difficulty,
        seed: u32,
    ) {
        if self.is_started() {
            self.reset();
        }
        let now = self.clock.now_ms();
        self.data.role = Some(role);
        self.data.player_number = Some(player_number);
        self.data.difficulty = Some(difficulty);
        self.data.game_start_time = Some(now);
        self.data.seed = Some(seed);
        self.start_auto_save();
        info!("game initialized: role={role} difficulty={} seed={seed}", difficulty.tag());
        self.emit(GameEvent::GameInitialized {
            role,
            difficulty,
            seed,
        });
    }

    /// Drop every field back to its default and stop auto-saving.
    pub fn reset(&mut self) {
        self.stop_auto_save();
        self.data = PlaythroughData::default();
        debug!("progression reset");
        self.emit(GameEvent::Reset);
    }

    /// Where [`advance`](Self::advance) would move to, without moving.
    pub fn next_position(&self) -> Position {
        let at = self.data.position;
        if at.level >= self.levels_per_chapter {
            Position::new(at.chapter.saturating_add(1), 1)
        } else {
            Position::new(at.chapter, at.level + 1)
        }
    }

    // --- mutators ---

    /// Mark the current level complete and move to the next one.
    ///
    /// From the last level of a chapter this moves to level 1 of the next
    /// chapter and emits `ChapterComplete`. Detecting the end of the game
    /// is left to the caller.
    pub fn advance(&mut self) -> Advance {
        let from = self.data.position;
        let key = from.level_key();
        if !self.data.completed_levels.contains(&key) {
            self.data.completed_levels.push(key);
        }

        let to = self.next_position();
        let chapter_completed = (to.chapter != from.chapter).then_some(from.chapter);
        self.data.position = to;

        if let Some(chapter) = chapter_completed {
            info!("chapter {chapter} complete");
            self.emit(GameEvent::ChapterComplete(chapter));
        }
        self.emit(GameEvent::LevelProgress(to));
        Advance {
            from,
            to,
            chapter_completed,
        }
    }

    /// Add kindling and re-check achievements. Returns the new total.
    pub fn add_kindling(&mut self, points: u32) -> u32 {
        self.data.kindling_points = self.data.kindling_points.saturating_add(points);
        let total = self.data.kindling_points;
        self.emit(GameEvent::KindlingChanged {
            total,
            delta: points,
        });
        self.evaluate_achievements();
        total
    }

    /// Insert an item unless one with the same id is already held.
    pub fn add_item(&mut self, item: Item) -> bool {
        if self.data.inventory.iter().any(|i| i.id == item.id) {
            return false;
        }
        self.data.inventory.push(item.clone());
        self.emit(GameEvent::ItemAdded(item));
        true
    }

    /// Append a choice at the current position.
    pub fn record_choice(&mut self, choice: Choice) {
        let position = self.data.position;
        self.data.choices.push(ChoiceRecord {
            chapter: position.chapter,
            level: position.level,
            choice: choice.clone(),
            timestamp: self.clock.now_ms(),
        });
        debug!("choice recorded at {}: {}", position.level_key(), choice.consequence);
        self.emit(GameEvent::ChoiceMade(choice));
    }

    pub fn record_hint_used(&mut self) -> u32 {
        self.data.hints_used += 1;
        self.emit(GameEvent::StateChanged);
        self.data.hints_used
    }

    /// Track a completed level's duration and re-check achievements.
    pub fn record_level_time(&mut self, elapsed_ms: u64) {
        self.data.fastest_level_ms = Some(
            self.data
                .fastest_level_ms
                .map_or(elapsed_ms, |best| best.min(elapsed_ms)),
        );
        self.evaluate_achievements();
    }

    /// Jump to a position, as a level restart or load does.
    pub fn set_position(&mut self, position: Position) {
        self.data.position = position;
        self.emit(GameEvent::StateChanged);
    }

    pub fn unlock_ending(&mut self, ending: EndingKey) {
        if !self.data.unlocked_endings.contains(&ending) {
            self.data.unlocked_endings.push(ending);
            self.emit(GameEvent::StateChanged);
        }
    }

    /// Refresh accumulated play time from the start timestamp.
    pub fn update_play_time(&mut self) -> u64 {
        if let Some(start) = self.data.game_start_time {
            self.data.total_play_time = self.clock.now_ms().saturating_sub(start);
        }
        self.data.total_play_time
    }

    pub fn modifiers(&self) -> DifficultyModifiers {
        self.difficulty().modifiers()
    }

    /// Record and announce every achievement that has newly become
    /// satisfied. Achievements are never revoked.
    pub fn evaluate_achievements(&mut self) -> Vec<AchievementId> {
        let unlocked = achievements::newly_satisfied(&self.data);
        for id in &unlocked {
            self.data.achievements.push(*id);
        }
        for id in &unlocked {
            info!("achievement unlocked: {}", id.info().name);
            self.emit(GameEvent::AchievementUnlocked(*id));
        }
        unlocked
    }

    pub fn resolve_ending(&self) -> EndingKey {
        resolve_ending(&self.data.choices)
    }

    /// True once the position has moved past the last chapter.
    pub fn is_complete(&self, chapter_count: u8) -> bool {
        self.data.position.chapter > chapter_count
    }

    // --- persistence ---

    /// Write the full state. Failures are logged and reported as `false`.
    pub fn save(&mut self) -> bool {
        self.update_play_time();
        let now = self.clock.now_ms();
        match self.gateway.save(&self.data, now) {
            Ok(file) => {
                debug!("saved under {}", self.gateway.key());
                self.emit(GameEvent::Saved {
                    save_date: file.save_date,
                });
                true
            }
            Err(e) => {
                warn!("failed to save game: {e}");
                false
            }
        }
    }

    /// Replace the state with the stored snapshot. Returns `false`, leaving
    /// the state untouched, when there is no save or it cannot be read.
    pub fn load(&mut self) -> bool {
        match self.gateway.load() {
            Ok(Some(file)) => {
                self.data = file.state;
                info!(
                    "loaded save from {} at {}",
                    file.save_date,
                    self.data.position.level_key()
                );
                self.emit(GameEvent::Loaded);
                true
            }
            Ok(None) => {
                debug!("no save under {}", self.gateway.key());
                false
            }
            Err(e) => {
                warn!("failed to load game: {e}");
                false
            }
        }
    }

    pub fn has_save(&self) -> bool {
        self.gateway.has_save()
    }

    /// (Re)arm the periodic auto-save from now.
    pub fn start_auto_save(&mut self) {
        self.stop_auto_save();
        let now = self.clock.now_ms();
        self.auto_save_timer = Some(self.auto_save.schedule(now, self.auto_save_interval_ms, ()));
    }

    fn stop_auto_save(&mut self) {
        if let Some(handle) = self.auto_save_timer.take() {
            self.auto_save.cancel(handle);
        }
    }

    pub fn auto_save_active(&self) -> bool {
        self.auto_save_timer
            .is_some_and(|handle| self.auto_save.is_pending(handle))
    }

    /// Save if the auto-save interval has elapsed, then re-arm the timer.
    /// Returns whether a save was attempted.
    pub fn poll_auto_save(&mut self) -> bool {
        let now = self.clock.now_ms();
        if self.auto_save.poll(now).is_empty() {
            return false;
        }
        self.auto_save_timer = Some(self.auto_save.schedule(now, self.auto_save_interval_ms, ()));
        self.save();
        true
    }
}

impl std::fmt::Debug for ProgressionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionState")
            .field("data", &self.data)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::persistence::{KeyValueStore, MemoryStore};
    use std::cell::RefCell;

    fn state_with(store: MemoryStore, clock: ManualClock) -> ProgressionState {
        let gateway = PersistenceGateway::new(Rc::new(store), "save");
        ProgressionState::new(gateway, Rc::new(clock))
    }

    fn fresh() -> ProgressionState {
        state_with(MemoryStore::new(), ManualClock::new(1_000))
    }

    fn choice(consequence: &str, kindling: u32) -> Choice {
        Choice {
            text: consequence.to_string(),
            consequence: consequence.to_string(),
            kindling,
        }
    }

    #[test]
    fn advance_walks_levels_in_order() {
        let mut state = fresh();
        state.initialize_game_with_seed(Role::Giver, 1, Difficulty::Medium, 7);
        let mut visited = vec![state.position()];
        let mut wraps = Vec::new();
        for _ in 0..6 {
            let step = state.advance();
            visited.push(step.to);
            if let Some(ch) = step.chapter_completed {
                wraps.push((ch, step.from.level));
            }
        }
        let expected: Vec<Position> = [(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3), (3, 1)]
            .iter()
            .map(|&(c, l)| Position::new(c, l))
            .collect();
        assert_eq!(visited, expected);
        assert_eq!(wraps, vec![(1, 3), (2, 3)]);
        assert_eq!(state.data().completed_levels.len(), 6);
    }

    #[test]
    fn chapter_complete_fires_before_level_progress() {
        let mut state = fresh();
        state.set_position(Position::new(1, 3));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        state.events_mut().on_any(move |e| sink.borrow_mut().push(e.clone()));
        state.advance();
        assert_eq!(
            *seen.borrow(),
            vec![
                GameEvent::ChapterComplete(1),
                GameEvent::LevelProgress(Position::new(2, 1))
            ]
        );
    }

    #[test]
    fn completed_levels_are_idempotent() {
        let mut state = fresh();
        state.advance();
        state.set_position(Position::START);
        state.advance();
        assert_eq!(state.data().completed_levels, vec!["ch1-lv1".to_string()]);
    }

    #[test]
    fn kindling_only_grows_and_unlocks() {
        let mut state = fresh();
        state.record_hint_used();
        assert_eq!(state.add_kindling(60), 60);
        assert_eq!(state.add_kindling(0), 60);
        assert_eq!(state.add_kindling(40), 100);
        assert_eq!(state.data().achievements, vec![AchievementId::KindlingCollector]);
        state.add_kindling(400);
        assert_eq!(
            state.data().achievements,
            vec![AchievementId::KindlingCollector, AchievementId::KindlingMaster]
        );
    }

    #[test]
    fn achievement_event_sees_applied_state() {
        let mut state = fresh();
        state.record_hint_used();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&observed);
        state.on(EventKind::AchievementUnlocked, move |e| sink.borrow_mut().push(e.clone()));
        state.add_kindling(150);
        assert_eq!(
            *observed.borrow(),
            vec![GameEvent::AchievementUnlocked(AchievementId::KindlingCollector)]
        );
        // Re-evaluating does not announce it again.
        assert!(state.evaluate_achievements().is_empty());
        assert_eq!(observed.borrow().len(), 1);
    }

    #[test]
    fn no_hints_awarded_at_first_level() {
        let mut state = fresh();
        state.add_kindling(5);
        assert!(state.data().achievements.contains(&AchievementId::NoHints));
    }

    #[test]
    fn speed_runner_from_level_time() {
        let mut state = fresh();
        state.record_hint_used();
        state.record_level_time(400_000);
        assert!(state.data().achievements.is_empty());
        state.record_level_time(120_000);
        assert_eq!(state.data().fastest_level_ms, Some(120_000));
        assert_eq!(state.data().achievements, vec![AchievementId::SpeedRunner]);
    }

    #[test]
    fn items_deduplicate_by_id() {
        let mut state = fresh();
        assert!(state.add_item(Item::new("Silver Compass", "🧭")));
        assert!(!state.add_item(Item::new("silver   compass", "📦")));
        assert_eq!(state.data().inventory.len(), 1);
    }

    #[test]
    fn choices_record_position_and_time() {
        let clock = ManualClock::new(5_000);
        let mut state = state_with(MemoryStore::new(), clock.clone());
        state.set_position(Position::new(2, 3));
        clock.advance(250);
        state.record_choice(choice("mercy", 10));
        let record = &state.data().choices[0];
        assert_eq!((record.chapter, record.level), (2, 3));
        assert_eq!(record.timestamp, 5_250);
        assert_eq!(state.resolve_ending(), EndingKey::CompassionateTwist);
    }

    #[test]
    fn modifiers_follow_difficulty() {
        let mut state = fresh();
        assert_eq!(state.modifiers(), Difficulty::Medium.modifiers());
        state.initialize_game_with_seed(Role::Seeker, 2, Difficulty::Hard, 1);
        assert_eq!(state.modifiers().puzzle_complexity, 1.3);
    }

    #[test]
    fn save_load_round_trip() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(10_000);
        let mut state = state_with(store.clone(), clock.clone());
        state.initialize_game_with_seed(Role::Seeker, 2, Difficulty::Easy, 4242);
        state.add_kindling(30);
        state.add_item(Item::new("Echo Stone", "🗿"));
        state.record_choice(choice("synthesis", 15));
        state.advance();
        clock.advance(60_000);
        assert!(state.save());

        let mut restored = state_with(store, clock);
        assert!(restored.load());
        assert_eq!(restored.data(), state.data());
        assert_eq!(restored.data().total_play_time, 60_000);
    }

    #[test]
    fn load_without_save_is_false() {
        let mut state = fresh();
        state.add_kindling(10);
        assert!(!state.load());
        assert_eq!(state.kindling(), 10);
    }

    #[test]
    fn corrupt_save_leaves_state_untouched() {
        let store = MemoryStore::new();
        store.set("save", r#"{"version":2,"saveDate":0,"state":{}}"#).unwrap();
        let mut state = state_with(store, ManualClock::new(0));
        state.add_kindling(3);
        assert!(!state.load());
        assert_eq!(state.kindling(), 3);
    }

    #[test]
    fn save_failure_is_false() {
        let mut state = state_with(MemoryStore::with_quota(8), ManualClock::new(0));
        assert!(!state.save());
    }

    #[test]
    fn auto_save_fires_on_interval_and_stops_on_reset() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut state = state_with(store.clone(), clock.clone()).with_auto_save_interval(1_000);
        assert!(!state.poll_auto_save());
        state.initialize_game_with_seed(Role::Giver, 1, Difficulty::Medium, 3);
        assert!(state.auto_save_active());

        clock.advance(999);
        assert!(!state.poll_auto_save());
        clock.advance(1);
        assert!(state.poll_auto_save());
        assert!(store.get("save").unwrap().is_some());
        clock.advance(1_000);
        assert!(state.poll_auto_save());

        state.reset();
        assert!(!state.auto_save_active());
        clock.advance(5_000);
        assert!(!state.poll_auto_save());
    }

    #[test]
    fn reinitialize_resets_first() {
        let mut state = fresh();
        state.initialize_game_with_seed(Role::Giver, 1, Difficulty::Easy, 1);
        state.add_kindling(50);
        state.advance();
        state.initialize_game_with_seed(Role::Seeker, 2, Difficulty::Hard, 2);
        assert_eq!(state.kindling(), 0);
        assert_eq!(state.position(), Position::START);
        assert_eq!(state.role(), Some(Role::Seeker));
        assert_eq!(state.seed(), Some(2));
    }

    #[test]
    fn random_initialize_sets_seed() {
        let mut state = fresh();
        let seed = state.initialize_game(Role::Giver, 1, Difficulty::Medium);
        assert_eq!(state.seed(), Some(seed));
        assert_eq!(state.data().game_start_time, Some(1_000));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = fresh();
        state.initialize_game_with_seed(Role::Giver, 1, Difficulty::Hard, 9);
        state.add_kindling(500);
        state.reset();
        assert_eq!(state.data(), &PlaythroughData::default());
    }

    #[test]
    fn unlocked_endings_deduplicate() {
        let mut state = fresh();
        state.unlock_ending(EndingKey::SelfSacrifice);
        state.unlock_ending(EndingKey::SelfSacrifice);
        assert_eq!(state.data().unlocked_endings, vec![EndingKey::SelfSacrifice]);
    }
}
