use leptos::prelude::*;

#[component]
pub fn Spinner(#[prop(optional)] small: bool) -> impl IntoView {
    view! { <div class="spinner" class:spinner-sm=small role="status" aria-label="Loading"></div> }
}
