//! Advisory two-player rooms over a shared key-value store.
//!
//! Each room is one JSON document under `mp_room_<CODE>`. Writers replace
//! the whole document, so concurrent writes are last-write-wins. There is
//! no authentication and no locking. Participants call [`RoomClient::poll`]
//! about every [`POLL_INTERVAL_MS`] to pick up the partner's changes.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;

use crate::core::clock::Clock;
use crate::core::persistence::{KeyValueStore, PersistenceError};
use crate::schema::choice::Choice;
use crate::schema::difficulty::Role;

pub const POLL_INTERVAL_MS: u64 = 2_000;
pub const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROOM_KEY_PREFIX: &str = "mp_room_";

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room not found: {0}")]
    NotFound(String),
    #[error("Room is full: {0}")]
    Full(String),
    #[error("Both players cannot have the same role ({0})")]
    RoleTaken(Role),
    #[error("not in a room")]
    NotJoined,
    #[error("room storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub role: Role,
    pub ready: bool,
    pub timestamp: u64,
    #[serde(default)]
    pub disconnected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedProgress {
    pub current_chapter: u8,
    pub current_level: u8,
    pub combined_kindling: u32,
}

impl Default for SharedProgress {
    fn default() -> Self {
        Self {
            current_chapter: 1,
            current_level: 1,
            combined_kindling: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSlot {
    pub choice: Choice,
    pub timestamp: u64,
}

/// The stored room document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDoc {
    pub host: PlayerSlot,
    #[serde(default)]
    pub guest: Option<PlayerSlot>,
    #[serde(default)]
    pub shared_data: SharedProgress,
    #[serde(default)]
    pub host_choice: Option<ChoiceSlot>,
    #[serde(default)]
    pub guest_choice: Option<ChoiceSlot>,
    pub created: u64,
}

impl RoomDoc {
    fn both_ready(&self) -> bool {
        self.host.ready && self.guest.as_ref().is_some_and(|g| g.ready)
    }
}

/// Changes observed by [`RoomClient::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    PartnerJoined(Role),
    BothReady,
    ProgressUpdate(SharedProgress),
    ChoiceReceived(Choice),
    PartnerLeft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: String,
    pub is_host: bool,
    pub role: Role,
    pub partner_role: Option<Role>,
}

#[derive(Debug, Clone)]
struct Session {
    info: RoomInfo,
    /// Last document seen by `poll`, for change detection.
    last_seen: Option<RoomDoc>,
}

pub struct RoomClient {
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    session: Option<Session>,
}

pub fn room_key(code: &str) -> String {
    format!("{ROOM_KEY_PREFIX}{code}")
}

/// Six random characters from `A-Z0-9`.
pub fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARS[rng.gen_range(0..ROOM_CODE_CHARS.len())] as char)
        .collect()
}

impl RoomClient {
    pub fn new(store: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            session: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn info(&self) -> Option<&RoomInfo> {
        self.session.as_ref().map(|s| &s.info)
    }

    fn read(&self, code: &str) -> Result<Option<RoomDoc>, RoomError> {
        match self.store.get(&room_key(code))? {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).map_err(PersistenceError::from)?,
            )),
            None => Ok(None),
        }
    }

    fn write(&self, code: &str, doc: &RoomDoc) -> Result<(), RoomError> {
        let json = serde_json::to_string(doc).map_err(PersistenceError::from)?;
        self.store.set(&room_key(code), &json)?;
        Ok(())
    }

    fn session(&self) -> Result<&Session, RoomError> {
        self.session.as_ref().ok_or(RoomError::NotJoined)
    }

    /// Read the current room, failing if it has vanished.
    fn current(&self) -> Result<(String, bool, RoomDoc), RoomError> {
        let session = self.session()?;
        let code = session.info.code.clone();
        let doc = self
            .read(&code)?
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        Ok((code, session.info.is_host, doc))
    }

    /// Open a new room as host. Returns the room code.
    pub fn create_room(&mut self, role: Role) -> Result<String, RoomError> {
        let mut code = generate_room_code();
        while self.read(&code)?.is_some() {
            code = generate_room_code();
        }
        let now = self.clock.now_ms();
        let doc = RoomDoc {
            host: PlayerSlot {
                role,
                ready: false,
                timestamp: now,
                disconnected: false,
            },
            guest: None,
            shared_data: SharedProgress::default(),
            host_choice: None,
            guest_choice: None,
            created: now,
        };
        self.write(&code, &doc)?;
        info!("created room {code} as {role}");
        self.session = Some(Session {
            info: RoomInfo {
                code: code.clone(),
                is_host: true,
                role,
                partner_role: None,
            },
            last_seen: Some(doc),
        });
        Ok(code)
    }

    /// Join an existing room as guest. The code is case-insensitive.
    pub fn join_room(&mut self, code: &str, role: Role) -> Result<(), RoomError> {
        let code = code.trim().to_uppercase();
        let mut doc = self
            .read(&code)?
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if doc.guest.is_some() {
            return Err(RoomError::Full(code));
        }
        if doc.host.role == role {
            return Err(RoomError::RoleTaken(role));
        }
        doc.guest = Some(PlayerSlot {
            role,
            ready: false,
            timestamp: self.clock.now_ms(),
            disconnected: false,
        });
        self.write(&code, &doc)?;
        info!("joined room {code} as {role}");
        self.session = Some(Session {
            info: RoomInfo {
                code,
                is_host: false,
                role,
                partner_role: Some(doc.host.role),
            },
            last_seen: Some(doc),
        });
        Ok(())
    }

    /// Set this side's ready flag. Returns whether both sides are ready.
    pub fn set_ready(&mut self, ready: bool) -> Result<bool, RoomError> {
        let (code, is_host, mut doc) = self.current()?;
        if is_host {
            doc.host.ready = ready;
        } else if let Some(guest) = doc.guest.as_mut() {
            guest.ready = ready;
        }
        self.write(&code, &doc)?;
        Ok(doc.both_ready())
    }

    pub fn both_ready(&self) -> Result<bool, RoomError> {
        let (_, _, doc) = self.current()?;
        Ok(doc.both_ready())
    }

    pub fn sync_progress(&mut self, progress: SharedProgress) -> Result<(), RoomError> {
        let (code, _, mut doc) = self.current()?;
        doc.shared_data = progress;
        self.write(&code, &doc)
    }

    pub fn shared_progress(&self) -> Result<SharedProgress, RoomError> {
        let (_, _, doc) = self.current()?;
        Ok(doc.shared_data)
    }

    pub fn send_choice(&mut self, choice: Choice) -> Result<(), RoomError> {
        let (code, is_host, mut doc) = self.current()?;
        let slot = Some(ChoiceSlot {
            choice,
            timestamp: self.clock.now_ms(),
        });
        if is_host {
            doc.host_choice = slot;
        } else {
            doc.guest_choice = slot;
        }
        self.write(&code, &doc)
    }

    pub fn other_choice(&self) -> Result<Option<Choice>, RoomError> {
        let (_, is_host, doc) = self.current()?;
        let slot = if is_host { doc.guest_choice } else { doc.host_choice };
        Ok(slot.map(|s| s.choice))
    }

    /// `(mine, theirs)` once both sides have sent a choice.
    pub fn both_choices(&self) -> Result<Option<(Choice, Choice)>, RoomError> {
        let (_, is_host, doc) = self.current()?;
        let (mine, theirs) = if is_host {
            (doc.host_choice, doc.guest_choice)
        } else {
            (doc.guest_choice, doc.host_choice)
        };
        Ok(mine.zip(theirs).map(|(m, t)| (m.choice, t.choice)))
    }

    /// Mark this side disconnected and drop the session.
    pub fn leave_room(&mut self) -> Result<(), RoomError> {
        let (code, is_host, mut doc) = self.current()?;
        if is_host {
            doc.host.disconnected = true;
        } else if let Some(guest) = doc.guest.as_mut() {
            guest.disconnected = true;
        }
        self.write(&code, &doc)?;
        info!("left room {code}");
        self.session = None;
        Ok(())
    }

    /// Re-read the room and report what changed since the last poll.
    pub fn poll(&mut self) -> Result<Vec<RoomEvent>, RoomError> {
        let (_, is_host, doc) = self.current()?;
        let session = self.session.as_mut().ok_or(RoomError::NotJoined)?;
        let previous = session.last_seen.take();
        let mut events = Vec::new();

        let partner = if is_host { doc.guest.clone() } else { Some(doc.host.clone()) };
        let previous_partner = previous
            .as_ref()
            .and_then(|p| if is_host { p.guest.clone() } else { Some(p.host.clone()) });

        if let Some(partner) = &partner {
            if is_host && previous_partner.is_none() {
                session.info.partner_role = Some(partner.role);
                events.push(RoomEvent::PartnerJoined(partner.role));
            }
            let was_gone = previous_partner.as_ref().is_some_and(|p| p.disconnected);
            if partner.disconnected && !was_gone {
                events.push(RoomEvent::PartnerLeft);
            }
        }

        if doc.both_ready() && !previous.as_ref().is_some_and(RoomDoc::both_ready) {
            events.push(RoomEvent::BothReady);
        }

        if previous.as_ref().map(|p| p.shared_data) != Some(doc.shared_data) {
            events.push(RoomEvent::ProgressUpdate(doc.shared_data));
        }

        let theirs = |d: &RoomDoc| {
            if is_host {
                d.guest_choice.clone()
            } else {
                d.host_choice.clone()
            }
        };
        let incoming = theirs(&doc);
        if incoming.is_some() && incoming != previous.as_ref().and_then(theirs) {
            if let Some(slot) = incoming {
                events.push(RoomEvent::ChoiceReceived(slot.choice));
            }
        }

        if !events.is_empty() {
            debug!("room poll: {events:?}");
        }
        session.last_seen = Some(doc);
        Ok(events)
    }
}

impl std::fmt::Debug for RoomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomClient")
            .field("session", &self.session.as_ref().map(|s| &s.info))
            .finish()
    }
}
