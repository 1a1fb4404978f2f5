use leptos::prelude::*;

use crate::{components::Profile, config::OperatorProfile};

#[component]
pub fn Header(profile: OperatorProfile, #[prop(into)] is_wide: Signal<bool>) -> impl IntoView {
    view! {
        <header class="header">
            <span class="logo">"admin" <span class="logo-accent">"."</span></span>
            <div class="header-actions">
                <nav class="notifications" aria-label="Notifications">
                    <button type="button" class="icon-button" aria-label="Notifications">"🔔"</button>
                    <button type="button" class="icon-button" aria-label="Invite user">"👤+"</button>
                </nav>
                <Profile profile=profile show_profile_data=is_wide />
            </div>
        </header>
    }
}
