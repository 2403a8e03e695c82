//! Who the client is acting as. The identity is fetched from the "who am I"
//! endpoint once per client and cached until authentication state changes
//! (login, logout, or a failed session recovery).

use crate::client::types::EntityId;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{PoisonError, RwLock},
};
use tracing::debug;

/// Roles in ascending seniority. Declaration order is the permission order:
/// a role satisfies every requirement at or below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Maps the backend role string. Unknown roles get the least privilege.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "teacher" => Self::Teacher,
            _ => Self::Student,
        }
    }

    #[must_use]
    pub fn at_least(self, required: Self) -> bool {
        self >= required
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn role(&self) -> Role {
        self.role.as_deref().map_or(Role::Student, Role::parse)
    }

    /// "First Last", falling back to the login.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if full.is_empty() {
            self.login.clone().unwrap_or_default()
        } else {
            full
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum IdentityState {
    /// Not fetched yet, or invalidated since the last fetch.
    #[default]
    Unresolved,
    Absent,
    Present(Identity),
}

impl IdentityState {
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Present(identity) => Some(identity),
            Self::Unresolved | Self::Absent => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: IdentityState,
    generation: u64,
}

/// Identity state shared by the gateway and its client. Every transition bumps
/// a generation so a slow `/auth/me` response cannot overwrite a newer state.
#[derive(Debug, Default)]
pub struct IdentityCache {
    slot: RwLock<Slot>,
}

impl IdentityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> IdentityState {
        self.snapshot().0
    }

    /// Current state with the generation it was observed at.
    #[must_use]
    pub fn snapshot(&self) -> (IdentityState, u64) {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        (slot.state.clone(), slot.generation)
    }

    /// Stores a resolved state if nothing changed since `generation`.
    /// Returns false when the write was discarded.
    pub fn store(&self, generation: u64, state: IdentityState) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            debug!(
                expected = generation,
                current = slot.generation,
                "discarding stale identity"
            );
            return false;
        }
        slot.state = state;
        slot.generation += 1;
        true
    }

    /// Forces a refetch on next resolution (after login).
    pub fn invalidate(&self) {
        self.transition(IdentityState::Unresolved);
    }

    /// Treats the client as unauthenticated (after logout or failed recovery).
    pub fn mark_absent(&self) {
        self.transition(IdentityState::Absent);
    }

    fn transition(&self, state: IdentityState) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.state = state;
        slot.generation += 1;
    }
}
