use leptos::{either::Either, prelude::*};

use crate::{
    config::PAGE_SIZE,
    pagination::{PageItem, PaginationModel},
};

/// Page buttons for `total_count` records, calling `on_page_change` with the picked page.
#[component]
pub fn Pagination(
    total_count: u64,
    current_page: u64,
    #[prop(into)] on_page_change: Callback<u64>,
) -> impl IntoView {
    let model = PaginationModel::new(total_count, PAGE_SIZE, current_page);
    let (first, last) = model.record_range();

    view! {
        <div class="pagination">
            <div class="pagination-range">
                <strong>{first}</strong>
                " - "
                <strong>{last}</strong>
                " of "
                <strong>{total_count}</strong>
            </div>
            <div class="pagination-pages">
                {model
                    .items()
                    .into_iter()
                    .map(|item| match item {
                        PageItem::Page { number, is_current, disabled } => {
                            Either::Left(
                                view! {
                                    <button
                                        type="button"
                                        class="pagination-item"
                                        class:current=is_current
                                        disabled=disabled
                                        on:click=move |_| on_page_change.run(number)
                                    >
                                        {number}
                                    </button>
                                },
                            )
                        }
                        PageItem::Gap => Either::Right(view! { <span class="pagination-gap">"..."</span> }),
                    })
                    .collect_view()}
            </div>
        </div>
    }
}
