use leptos::{either::Either, prelude::*};

use crate::config::OperatorProfile;

#[component]
pub fn Profile(profile: OperatorProfile, #[prop(into)] show_profile_data: Signal<bool>) -> impl IntoView {
    let OperatorProfile {
        name,
        email,
        avatar_url,
    } = profile.clone();
    let initials = profile.initials();

    view! {
        <div class="profile">
            <Show when=move || show_profile_data.get()>
                <div class="profile-data">
                    <p class="profile-name">{name.clone()}</p>
                    <p class="profile-email">{email.clone()}</p>
                </div>
            </Show>
            {match avatar_url {
                Some(avatar_url) => {
                    Either::Left(view! { <img class="avatar" src=avatar_url alt=initials /> })
                }
                None => Either::Right(view! { <span class="avatar avatar-initials">{initials}</span> }),
            }}
        </div>
    }
}
