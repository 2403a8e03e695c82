//! Navigable destinations of the school client and the role each one requires.
//! The requirement lookup is an exhaustive match, so adding a destination
//! without deciding who may reach it does not compile.

mod gate;

pub use gate::{evaluate, links_for, Decision};

use crate::identity::Role;
use std::fmt;

/// Who may reach a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Only without an identity (the login screen).
    Anonymous,
    /// Any identity, whatever its role.
    Authenticated,
    /// The given role or anything more senior.
    AtLeast(Role),
}

impl Requirement {
    #[must_use]
    pub fn admits(self, role: Role) -> bool {
        match self {
            Self::Anonymous => false,
            Self::Authenticated => true,
            Self::AtLeast(required) => role.at_least(required),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    Login,
    Home,
    AdminTeachers,
    AdminStudents,
    AdminGroups,
    TeacherDashboard,
    TeacherTopics,
    TeacherTests,
    TeacherTestDetails(String),
    TeacherGrades,
}

impl Destination {
    /// Destinations reachable without parameters, in menu order.
    pub const MENU: [Self; 7] = [
        Self::TeacherDashboard,
        Self::AdminTeachers,
        Self::AdminStudents,
        Self::AdminGroups,
        Self::TeacherTopics,
        Self::TeacherTests,
        Self::TeacherGrades,
    ];

    /// Matches a path (query string and trailing slash ignored).
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Self::Home),
            ["login"] => Some(Self::Login),
            ["admin", "teachers"] => Some(Self::AdminTeachers),
            ["admin", "students"] => Some(Self::AdminStudents),
            ["admin", "groups"] => Some(Self::AdminGroups),
            ["teacher", "dashboard"] => Some(Self::TeacherDashboard),
            ["teacher", "topics"] => Some(Self::TeacherTopics),
            ["teacher", "tests"] => Some(Self::TeacherTests),
            ["teacher", "tests", id] => Some(Self::TeacherTestDetails((*id).to_string())),
            ["teacher", "grades"] => Some(Self::TeacherGrades),
            _ => None,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Home => "/".to_string(),
            Self::AdminTeachers => "/admin/teachers".to_string(),
            Self::AdminStudents => "/admin/students".to_string(),
            Self::AdminGroups => "/admin/groups".to_string(),
            Self::TeacherDashboard => "/teacher/dashboard".to_string(),
            Self::TeacherTopics => "/teacher/topics".to_string(),
            Self::TeacherTests => "/teacher/tests".to_string(),
            Self::TeacherTestDetails(id) => format!("/teacher/tests/{id}"),
            Self::TeacherGrades => "/teacher/grades".to_string(),
        }
    }

    #[must_use]
    pub fn requirement(&self) -> Requirement {
        match self {
            Self::Login => Requirement::Anonymous,
            Self::Home => Requirement::Authenticated,
            Self::AdminTeachers => Requirement::AtLeast(Role::Admin),
            Self::AdminStudents
            | Self::AdminGroups
            | Self::TeacherDashboard
            | Self::TeacherTopics
            | Self::TeacherTests
            | Self::TeacherTestDetails(_)
            | Self::TeacherGrades => Requirement::AtLeast(Role::Teacher),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.path())
    }
}
