use super::{Destination, Requirement};
use crate::identity::{IdentityState, Role};
use tracing::debug;

/// Outcome of one navigation check. Redirects replace the current history
/// entry rather than pushing a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Identity still loading; render a neutral waiting state.
    Wait,
    Allow(Destination),
    Redirect(Destination),
}

impl Decision {
    /// Where the client ends up, if a decision was made.
    #[must_use]
    pub fn target_path(&self) -> Option<String> {
        match self {
            Self::Wait => None,
            Self::Allow(destination) | Self::Redirect(destination) => Some(destination.path()),
        }
    }
}

/// Decides whether the current identity may open `path`.
#[must_use]
pub fn evaluate(identity: &IdentityState, path: &str) -> Decision {
    let destination = Destination::parse(path);

    let decision = match identity {
        IdentityState::Unresolved => Decision::Wait,
        IdentityState::Absent => match destination {
            Some(Destination::Login) => Decision::Allow(Destination::Login),
            _ => Decision::Redirect(Destination::Login),
        },
        IdentityState::Present(identity) => match destination {
            Some(Destination::Login) | None => Decision::Redirect(Destination::Home),
            Some(destination) => {
                if destination.requirement().admits(identity.role()) {
                    Decision::Allow(destination)
                } else {
                    Decision::Redirect(Destination::Home)
                }
            }
        },
    };

    debug!(path, ?decision, "navigation evaluated");
    decision
}

/// Menu destinations `role` may open from the home screen.
///
/// Derived from the requirement table, so teachers are not offered the
/// teacher accounts screen even though the web home page shows them that
/// button: following it would only redirect them home.
#[must_use]
pub fn links_for(role: Role) -> Vec<Destination> {
    Destination::MENU
        .into_iter()
        .filter(|destination| {
            matches!(destination.requirement(), Requirement::AtLeast(_))
                && destination.requirement().admits(role)
        })
        .collect()
}
