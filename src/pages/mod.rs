//! Presentation pages, rendered on the server with Leptos.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages are placeholders: each renders a title and a short body. Pages
//! reached through a role scope are wrapped in that role's layout shell by
//! [`render`]. Nothing here makes authorization decisions.

pub mod catalog;
mod layout;

use leptos::prelude::*;

use crate::routes::table::Scope;
use crate::session::Principal;
use catalog::CourseGrid;
use layout::RoleLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    AdminDashboard,
    FacultyDashboard,
    StudentDashboard,
    // Student
    Courses,
    Lectures,
    Assignments,
    Quizzes,
    Grades,
    // Faculty
    CourseCreation,
    AssignmentManagement,
    QuizManagement,
    StudentTracking,
    // Admin
    UserManagement,
    ReportGeneration,
    Announcements,
    CourseManagement,
}

impl Page {
    /// Dashboard shown to a role.
    #[must_use]
    pub fn dashboard(scope: Scope) -> Self {
        match scope {
            Scope::Admin => Self::AdminDashboard,
            Scope::Faculty => Self::FacultyDashboard,
            Scope::Student => Self::StudentDashboard,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Home => "Learning Management System",
            Self::Login => "Sign in",
            Self::AdminDashboard => "Admin Dashboard",
            Self::FacultyDashboard => "Faculty Dashboard",
            Self::StudentDashboard => "Student Dashboard",
            Self::Courses => "Courses",
            Self::Lectures => "Lectures",
            Self::Assignments => "Assignments",
            Self::Quizzes => "Quizzes",
            Self::Grades => "Grades",
            Self::CourseCreation => "Course Creation",
            Self::AssignmentManagement => "Assignment Management",
            Self::QuizManagement => "Quiz Management",
            Self::StudentTracking => "Student Tracking",
            Self::UserManagement => "User Management",
            Self::ReportGeneration => "Report Generation",
            Self::Announcements => "Announcements",
            Self::CourseManagement => "Course Management",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Self::Home => "Courses, assignments, quizzes and grades for students, faculty and administrators.",
            Self::Login => "Sign in with your institution account.",
            Self::AdminDashboard => "Manage users, courses, reports and announcements.",
            Self::FacultyDashboard => "Create courses, manage assignments and quizzes, and track students.",
            Self::StudentDashboard => "Your courses, lectures, assignments, quizzes and grades.",
            Self::Courses => "Courses you are enrolled in.",
            Self::Lectures => "Lecture materials for your courses.",
            Self::Assignments => "Open and submitted assignments.",
            Self::Quizzes => "Upcoming and completed quizzes.",
            Self::Grades => "Grades across your courses.",
            Self::CourseCreation | Self::CourseManagement => "Create or update course content.",
            Self::AssignmentManagement => "Publish and review assignments.",
            Self::QuizManagement => "Author and schedule quizzes.",
            Self::StudentTracking => "Follow student progress.",
            Self::UserManagement => "Manage student, faculty and admin accounts.",
            Self::ReportGeneration => "Generate institutional reports.",
            Self::Announcements => "Post announcements to all users.",
        }
    }
}

/// Request-specific data a page may show.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageContext<'a> {
    pub principal: Option<&'a Principal>,
    /// Current request path.
    pub path: &'a str,
    /// Post-login return target carried by the login page.
    pub from: Option<&'a str>,
    /// Sign-in error code carried by the login page.
    pub error: Option<&'a str>,
}

/// Render a full HTML document for `page`.
#[must_use]
pub fn render(page: Page, layout: Option<Scope>, cx: &PageContext<'_>) -> String {
    let title = page.title();
    let who = cx
        .principal
        .map(|p| p.email.clone().unwrap_or_else(|| p.uid.clone()))
        .unwrap_or_default();
    let path = cx.path.to_owned();
    let from = cx.from.map(str::to_owned);
    let error = cx.error.map(sign_in_error_message);

    render_document(move || {
        let body = page_body(page, path, from, error);
        let main = match layout {
            Some(scope) => view! { <RoleLayout scope=scope who=who title=title>{body}</RoleLayout> }.into_any(),
            None => view! { <main><h1>{title}</h1>{body}</main> }.into_any(),
        };
        view! {
            <html>
                <head>
                    <meta charset="utf-8"/>
                    <title>{title}</title>
                </head>
                <body>{main}</body>
            </html>
        }
    })
}

/// Shown while the session is still resolving. Refreshes itself.
#[must_use]
pub fn render_loading() -> String {
    render_document(|| {
        view! {
            <html>
                <head>
                    <meta charset="utf-8"/>
                    <meta http-equiv="refresh" content="1"/>
                    <title>"Loading"</title>
                </head>
                <body>
                    <div class="loading">"Loading..."</div>
                </body>
            </html>
        }
    })
}

/// Build the view under a fresh reactive owner and serialize it.
fn render_document<F, V>(build: F) -> String
where
    F: FnOnce() -> V,
    V: IntoView,
{
    let owner = Owner::new();
    let html = owner.with(|| build().to_html());
    format!("<!DOCTYPE html>{html}")
}

fn page_body(page: Page, path: String, from: Option<String>, error: Option<&'static str>) -> AnyView {
    let summary = page.summary();
    match page {
        Page::Home => view! {
            <p>{summary}</p>
            <p class="links">
                <a href="/login">"Sign in"</a>
                <a href="/dashboard">"Dashboard"</a>
            </p>
        }
        .into_any(),
        Page::Login => view! {
            <p>{summary}</p>
            {login_form(from, error)}
        }
        .into_any(),
        Page::CourseCreation | Page::CourseManagement => view! {
            <p>{summary}</p>
            <CourseGrid return_to=path/>
        }
        .into_any(),
        _ => view! { <p>{summary}</p> }.into_any(),
    }
}

fn login_form(from: Option<String>, error: Option<&'static str>) -> impl IntoView {
    let notice = from
        .as_deref()
        .map(|target| format!("You will return to {target} after signing in."));
    let hidden_from = from.unwrap_or_default();

    view! {
        {error.map(|message| view! { <p class="error">{message}</p> })}
        {notice.map(|notice| view! { <p class="return-to">{notice}</p> })}
        <form method="post" action="/api/auth/sign-in">
            <input type="email" name="email" required=true/>
            <input type="password" name="password"/>
            <input type="hidden" name="from" value=hidden_from/>
            <button type="submit">"Sign in"</button>
        </form>
    }
}

fn sign_in_error_message(code: &str) -> &'static str {
    match code {
        "invalid-credentials" => "Email or password is incorrect.",
        "provider-unavailable" => "Sign-in is temporarily unavailable. Try again shortly.",
        _ => "Sign-in failed.",
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
