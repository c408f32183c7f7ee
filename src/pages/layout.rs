//! Role-tagged layout shell around role pages.

use leptos::prelude::*;

use crate::routes::table::{Scope, routes_for};

/// Header with the role badge and sign-out button, navigation built from the
/// role's routes, then the page itself.
#[component]
pub fn RoleLayout(scope: Scope, who: String, title: &'static str, children: Children) -> impl IntoView {
    let links = routes_for(scope)
        .map(|(path, page)| view! { <a href=path>{page.title()}</a> })
        .collect_view();

    view! {
        <div class="layout" data-role=scope.as_str()>
            <header>
                <span class="role-badge">{scope.as_str()}</span>
                <span class="user">{who}</span>
                <form method="post" action="/api/auth/sign-out">
                    <button type="submit">"Sign out"</button>
                </form>
            </header>
            <nav>
                <a href="/dashboard">"Dashboard"</a>
                {links}
            </nav>
            <main>
                <h1>{title}</h1>
                {children()}
            </main>
        </div>
    }
}
