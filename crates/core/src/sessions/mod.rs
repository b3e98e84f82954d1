//! Connected player sessions
//!
//! One [`Session`] per occupied client slot. Slots are reused when a player
//! leaves, so every connect bumps the slot's generation; a [`SessionRef`]
//! held across a disconnect stops resolving instead of pointing at the next
//! player in that slot.

mod resolver;

pub use resolver::PlayerResolver;

use crate::error::{AdminError, AdminResult};
use crate::text;

/// Default number of client slots
pub const MAX_CLIENTS: usize = 64;

/// Engine connection state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Free,
    Zombie,
    Connecting,
    Active,
}

impl ConnectionState {
    /// Map the engine's client state index (free, zombie, connected,
    /// primed, active)
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Zombie,
            2 | 3 => Self::Connecting,
            4 => Self::Active,
            _ => Self::Free,
        }
    }

    /// Anything but `Free` counts as an occupied slot
    pub fn is_occupied(self) -> bool {
        self != Self::Free
    }
}

/// Team a player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Team {
    #[default]
    Free,
    Red,
    Blue,
    Spectator,
}

impl Team {
    /// Map the engine's team index
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Red,
            2 => Self::Blue,
            3 => Self::Spectator,
            _ => Self::Free,
        }
    }

    /// Parse a team argument (`red`, `r`, `blue`, `b`, `spectator`, `s`)
    pub fn parse(arg: &str) -> Option<Self> {
        match arg.to_ascii_lowercase().as_str() {
            "red" | "r" => Some(Self::Red),
            "blue" | "b" => Some(Self::Blue),
            "spectator" | "spec" | "s" => Some(Self::Spectator),
            _ => None,
        }
    }

    /// Name the `forceteam` console command expects
    pub fn console_name(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Spectator => "spectator",
        }
    }

    /// Coloured label for chat output
    pub fn label(self) -> &'static str {
        match self {
            Self::Free => "^3Free",
            Self::Red => "^1Red",
            Self::Blue => "^4Blue",
            Self::Spectator => "^3Spectator",
        }
    }
}

/// Stable reference to a session.
///
/// Resolves only while the slot still holds the same connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionRef {
    pub slot: usize,
    pub generation: u32,
}

/// A connected player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub slot: usize,
    pub generation: u32,
    /// Display name, may carry colour codes
    pub name: String,
    /// Client GUID, empty when the client did not send one
    pub guid: String,
    /// Address without port
    pub ip: String,
    pub state: ConnectionState,
    pub team: Team,
}

impl Session {
    pub fn session_ref(&self) -> SessionRef {
        SessionRef {
            slot: self.slot,
            generation: self.generation,
        }
    }

    /// Display name with colour codes removed
    pub fn clean_name(&self) -> String {
        text::clean_name(&self.name)
    }

    pub fn has_guid(&self) -> bool {
        !self.guid.is_empty()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    session: Option<Session>,
}

/// All client slots on the server
#[derive(Debug)]
pub struct SessionTable {
    slots: Vec<Slot>,
}

impl SessionTable {
    pub fn new(max_clients: usize) -> Self {
        let mut slots = Vec::with_capacity(max_clients);
        slots.resize_with(max_clients, Slot::default);
        Self { slots }
    }

    pub fn max_clients(&self) -> usize {
        self.slots.len()
    }

    /// Start a new session in `slot`, replacing whatever was there.
    pub fn connect(
        &mut self,
        slot: usize,
        name: &str,
        guid: &str,
        ip: &str,
    ) -> AdminResult<SessionRef> {
        let max = self.max_clients();
        let entry = self.slots.get_mut(slot).ok_or_else(|| {
            AdminError::InvalidArgument(format!("slot {} out of range (max {})", slot, max))
        })?;

        entry.generation = entry.generation.wrapping_add(1);
        let session = Session {
            slot,
            generation: entry.generation,
            name: name.to_string(),
            guid: guid.to_string(),
            ip: text::strip_port(ip).to_string(),
            state: ConnectionState::Active,
            team: Team::Free,
        };
        let session_ref = session.session_ref();
        entry.session = Some(session);

        tracing::debug!(slot, generation = session_ref.generation, "Session opened");
        Ok(session_ref)
    }

    /// Free `slot`, returning the session that was in it
    pub fn disconnect(&mut self, slot: usize) -> Option<Session> {
        let session = self.slots.get_mut(slot)?.session.take();
        if session.is_some() {
            tracing::debug!(slot, "Session closed");
        }
        session
    }

    /// Change the connection state of an occupied slot.
    ///
    /// Setting `Free` closes the session.
    pub fn set_state(&mut self, slot: usize, state: ConnectionState) {
        if state == ConnectionState::Free {
            self.disconnect(slot);
        } else if let Some(session) = self.by_slot_mut(slot) {
            session.state = state;
        }
    }

    /// Resolve a reference, failing if the slot has been reused
    pub fn get(&self, session_ref: SessionRef) -> Option<&Session> {
        self.by_slot(session_ref.slot)
            .filter(|s| s.generation == session_ref.generation)
    }

    pub fn get_mut(&mut self, session_ref: SessionRef) -> Option<&mut Session> {
        self.by_slot_mut(session_ref.slot)
            .filter(|s| s.generation == session_ref.generation)
    }

    /// Current session in `slot`, if occupied
    pub fn by_slot(&self, slot: usize) -> Option<&Session> {
        self.slots
            .get(slot)?
            .session
            .as_ref()
            .filter(|s| s.state.is_occupied())
    }

    pub fn by_slot_mut(&mut self, slot: usize) -> Option<&mut Session> {
        self.slots
            .get_mut(slot)?
            .session
            .as_mut()
            .filter(|s| s.state.is_occupied())
    }

    /// First occupied session with this GUID
    pub fn by_guid(&self, guid: &str) -> Option<&Session> {
        if guid.is_empty() {
            return None;
        }
        self.iter().find(|s| s.guid == guid)
    }

    /// Occupied sessions in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.slots
            .iter()
            .filter_map(|slot| slot.session.as_ref())
            .filter(|s| s.state.is_occupied())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new(MAX_CLIENTS)
    }
}
