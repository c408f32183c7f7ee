//! Static course catalog shown on the course creation and management pages.

use leptos::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Course {
    pub id: u32,
    pub title: &'static str,
    pub image: &'static str,
}

pub static COURSES: &[Course] = &[
    Course { id: 1, title: "Data Structures", image: "/dsa.jpg" },
    Course { id: 2, title: "Web Development", image: "/web.jpg" },
    Course { id: 3, title: "Operating Systems", image: "/os.png" },
    Course { id: 4, title: "Computer Networks", image: "/cn.jpg" },
    Course { id: 5, title: "Database Management", image: "/dbms.png" },
    Course { id: 6, title: "Software Engineering", image: "/software.jpeg" },
];

/// Content actions offered above the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAction {
    Create,
    Update,
}

impl ContentAction {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Create => "Create Content",
            Self::Update => "Update Content",
        }
    }
}

/// Action buttons plus the course grid. `return_to` is where the action
/// endpoint sends the browser back to.
#[component]
pub fn CourseGrid(return_to: String) -> impl IntoView {
    let actions = [ContentAction::Create, ContentAction::Update]
        .into_iter()
        .map(|action| {
            view! {
                <form method="post" action="/api/course-content">
                    <input type="hidden" name="action" value=action.as_str()/>
                    <input type="hidden" name="return_to" value=return_to.clone()/>
                    <button type="submit">{action.label()}</button>
                </form>
            }
        })
        .collect_view();

    let cards = COURSES
        .iter()
        .map(|course| {
            view! {
                <div class="course-card" data-course-id=course.id.to_string()>
                    <img src=course.image alt=course.title/>
                    <h3>{course.title}</h3>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="content-actions">{actions}</div>
        <div class="course-grid">{cards}</div>
    }
}
