//! Turning an admin-typed handle into a session
//!
//! Order of attempts:
//! 1. a slot number naming an occupied slot
//! 2. exact case-insensitive match on the raw or cleaned name
//! 3. case-insensitive substring of the cleaned name, accepted only when
//!    exactly one player matches

use super::{Session, SessionTable};
use crate::error::{AdminError, AdminResult};
use crate::text::{clean_name, contains_ignore_case, eq_ignore_case};

/// Resolves player handles against a session table
pub struct PlayerResolver<'a> {
    sessions: &'a SessionTable,
}

impl<'a> PlayerResolver<'a> {
    pub fn new(sessions: &'a SessionTable) -> Self {
        Self { sessions }
    }

    /// Resolve `handle` to exactly one connected player.
    ///
    /// An empty handle is `InvalidArgument`; no match or an ambiguous
    /// substring is `NotFound`.
    pub fn resolve(&self, handle: &str) -> AdminResult<&'a Session> {
        if handle.is_empty() {
            return Err(AdminError::InvalidArgument("empty player handle".to_string()));
        }

        if let Some(session) = self.by_slot_number(handle) {
            return Ok(session);
        }

        if let Some(session) = self.by_exact_name(handle) {
            return Ok(session);
        }

        let candidates = self.by_fragment(handle);
        match candidates.as_slice() {
            [only] => Ok(*only),
            [] => Err(AdminError::NotFound(handle.to_string())),
            _ => {
                tracing::debug!(handle, matches = candidates.len(), "Ambiguous player handle");
                Err(AdminError::NotFound(handle.to_string()))
            }
        }
    }

    fn by_slot_number(&self, handle: &str) -> Option<&'a Session> {
        if !handle.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let slot: usize = handle.parse().ok()?;
        self.sessions.by_slot(slot)
    }

    fn by_exact_name(&self, handle: &str) -> Option<&'a Session> {
        let cleaned_handle = clean_name(handle);
        self.sessions.iter().find(|s| {
            eq_ignore_case(&s.name, handle) || eq_ignore_case(&s.clean_name(), &cleaned_handle)
        })
    }

    fn by_fragment(&self, handle: &str) -> Vec<&'a Session> {
        let fragment = clean_name(handle);
        if fragment.is_empty() {
            return Vec::new();
        }
        self.sessions
            .iter()
            .filter(|s| contains_ignore_case(&s.clean_name(), &fragment))
            .collect()
    }
}
