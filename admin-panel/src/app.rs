use admin_query::QueryClient;
use leptos::prelude::*;

use crate::{
    breakpoint::use_breakpoint_reached,
    components::{Header, Sidebar, UserList},
    config::{ApiConfig, OperatorProfile, WIDE_BREAKPOINT},
};

#[component]
pub fn App() -> impl IntoView {
    QueryClient::new().provide();
    provide_context(ApiConfig::from_env());

    // The only resize listener on the page, shared by everything that toggles on width.
    let is_wide = use_breakpoint_reached(WIDE_BREAKPOINT);

    view! {
        <div class="app">
            <Header profile=OperatorProfile::from_env() is_wide=is_wide />
            <div class="layout">
                <Show when=move || is_wide.get()>
                    <Sidebar />
                </Show>
                <main class="content">
                    <UserList is_wide=is_wide />
                </main>
            </div>
        </div>
    }
}
