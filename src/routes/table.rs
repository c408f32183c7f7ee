//! Route table and role gate.
//!
//! DESIGN
//! ======
//! Every client-visible path is declared once in [`ROUTES`] together with
//! what it requires. [`dispatch`] is a pure function of the path and a
//! `SessionState` snapshot; it never builds a per-role route tree. A scoped
//! route that belongs to a different known role behaves as if it were not
//! registered and falls through to the catch-all (`/`). Sessions without a
//! usable role are sent to `/login` instead.

use crate::pages::Page;
use crate::session::{Phase, Role, SessionState};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Route tree a known role unlocks. Also tags the layout shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Admin,
    Faculty,
    Student,
}

impl Scope {
    /// Scope granted by a role. Unrecognized roles grant nothing.
    #[must_use]
    pub fn from_role(role: &Role) -> Option<Self> {
        match role {
            Role::Admin => Some(Self::Admin),
            Role::Faculty => Some(Self::Faculty),
            Role::Student => Some(Self::Student),
            Role::Unrecognized(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Faculty => "faculty",
            Self::Student => "student",
        }
    }
}

/// What a route needs before it renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Always reachable.
    Public(Page),
    /// The signed-in role's dashboard.
    Dashboard,
    /// Only registered for sessions holding this scope.
    Scoped(Scope, Page),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub target: Target,
}

const fn public(path: &'static str, page: Page) -> RouteEntry {
    RouteEntry { path, target: Target::Public(page) }
}

const fn scoped(path: &'static str, scope: Scope, page: Page) -> RouteEntry {
    RouteEntry { path, target: Target::Scoped(scope, page) }
}

pub static ROUTES: &[RouteEntry] = &[
    public(HOME_PATH, Page::Home),
    public(LOGIN_PATH, Page::Login),
    RouteEntry { path: DASHBOARD_PATH, target: Target::Dashboard },
    // Student
    scoped("/student/courses", Scope::Student, Page::Courses),
    scoped("/student/lectures", Scope::Student, Page::Lectures),
    scoped("/student/assignments", Scope::Student, Page::Assignments),
    scoped("/student/quizzes", Scope::Student, Page::Quizzes),
    scoped("/student/grades", Scope::Student, Page::Grades),
    // Admin
    scoped("/admin/user-management", Scope::Admin, Page::UserManagement),
    scoped("/admin/report-generation", Scope::Admin, Page::ReportGeneration),
    scoped("/admin/announcements", Scope::Admin, Page::Announcements),
    scoped("/admin/course-management", Scope::Admin, Page::CourseManagement),
    // Faculty
    scoped("/faculty/course-creation", Scope::Faculty, Page::CourseCreation),
    scoped("/faculty/assignment-management", Scope::Faculty, Page::AssignmentManagement),
    scoped("/faculty/quiz-management", Scope::Faculty, Page::QuizManagement),
    scoped("/faculty/student-tracking", Scope::Faculty, Page::StudentTracking),
];

/// Scoped routes of one role, in table order. Feeds the layout navigation.
pub fn routes_for(scope: Scope) -> impl Iterator<Item = (&'static str, Page)> {
    ROUTES.iter().filter_map(move |entry| match entry.target {
        Target::Scoped(s, page) if s == scope => Some((entry.path, page)),
        _ => None,
    })
}

/// Trim trailing slashes; the root stays `/`.
#[must_use]
pub fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { HOME_PATH } else { trimmed }
}

#[must_use]
pub fn lookup(path: &str) -> Option<&'static RouteEntry> {
    let path = normalize(path);
    ROUTES.iter().find(|entry| entry.path == path)
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Where to send the client instead of rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub to: &'static str,
    /// Originally requested path, for a post-login return.
    pub from: Option<String>,
}

impl Redirection {
    fn to(to: &'static str) -> Self {
        Self { to, from: None }
    }

    fn sign_in(from: Option<&str>) -> Self {
        Self { to: LOGIN_PATH, from: from.map(str::to_owned) }
    }

    /// `Location` header value.
    #[must_use]
    pub fn location(&self) -> String {
        match &self.from {
            Some(from) => format!("{}?from={}", self.to, urlencoding::encode(from)),
            None => self.to.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Session not resolved yet; show the loading indicator.
    Loading,
    /// Render `page`, inside the role-tagged layout when `layout` is set.
    Render { page: Page, layout: Option<Scope> },
    Redirect(Redirection),
}

/// Decide what a request for `path` gets under `state`.
#[must_use]
pub fn dispatch(path: &str, state: &SessionState) -> Dispatch {
    let (signed_in, scope) = match state.phase() {
        Phase::Loading => return Dispatch::Loading,
        Phase::Anonymous => (false, None),
        Phase::Authenticated(role) => (true, role.and_then(Scope::from_role)),
    };
    let path = normalize(path);
    let Some(entry) = lookup(path) else {
        return Dispatch::Redirect(Redirection::to(HOME_PATH));
    };

    match entry.target {
        Target::Public(page) => Dispatch::Render { page, layout: None },
        Target::Dashboard => match (signed_in, scope) {
            (false, _) => Dispatch::Redirect(Redirection::sign_in(Some(path))),
            (true, Some(scope)) => Dispatch::Render { page: Page::dashboard(scope), layout: Some(scope) },
            (true, None) => Dispatch::Redirect(Redirection::sign_in(None)),
        },
        Target::Scoped(required, page) => match (signed_in, scope) {
            (false, _) => Dispatch::Redirect(Redirection::sign_in(Some(path))),
            (true, None) => Dispatch::Redirect(Redirection::sign_in(None)),
            (true, Some(scope)) if scope == required => Dispatch::Render { page, layout: Some(scope) },
            (true, Some(_)) => Dispatch::Redirect(Redirection::to(HOME_PATH)),
        },
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
