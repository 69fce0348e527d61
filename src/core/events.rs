//! Typed observer bus for playthrough notifications.
//!
//! Listeners run synchronously, in registration order, after the mutation
//! that produced the event has been fully applied.

use crate::core::achievements::AchievementId;
use crate::schema::choice::{Choice, Item};
use crate::schema::difficulty::{Difficulty, Position, Role};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameInitialized {
        role: Role,
        difficulty: Difficulty,
        seed: u32,
    },
    StateChanged,
    KindlingChanged {
        total: u32,
        delta: u32,
    },
    ItemAdded(Item),
    ChoiceMade(Choice),
    AchievementUnlocked(AchievementId),
    /// Emitted with the chapter that was just finished.
    ChapterComplete(u8),
    /// Emitted with the position the player moved to.
    LevelProgress(Position),
    Saved {
        save_date: u64,
    },
    Loaded,
    Reset,
}

/// Discriminant used to subscribe to one kind of event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameInitialized,
    StateChanged,
    KindlingChanged,
    ItemAdded,
    ChoiceMade,
    AchievementUnlocked,
    ChapterComplete,
    LevelProgress,
    Saved,
    Loaded,
    Reset,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::GameInitialized { .. } => EventKind::GameInitialized,
            Self::StateChanged => EventKind::StateChanged,
            Self::KindlingChanged { .. } => EventKind::KindlingChanged,
            Self::ItemAdded(_) => EventKind::ItemAdded,
            Self::ChoiceMade(_) => EventKind::ChoiceMade,
            Self::AchievementUnlocked(_) => EventKind::AchievementUnlocked,
            Self::ChapterComplete(_) => EventKind::ChapterComplete,
            Self::LevelProgress(_) => EventKind::LevelProgress,
            Self::Saved { .. } => EventKind::Saved,
            Self::Loaded => EventKind::Loaded,
            Self::Reset => EventKind::Reset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&GameEvent)>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Option<EventKind>, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind of event.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.register(Some(kind), Box::new(listener))
    }

    /// Subscribe to every event.
    pub fn on_any<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.register(None, Box::new(listener))
    }

    fn register(&mut self, kind: Option<EventKind>, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: &GameEvent) {
        let kind = event.kind();
        for (_, filter, listener) in self.listeners.iter_mut() {
            if filter.map_or(true, |k| k == kind) {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
