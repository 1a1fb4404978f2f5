use admin_query::{QueryClient, use_query};
use leptos::{either::EitherOf3, prelude::*};

use crate::{
    components::{Pagination, Spinner},
    config::ApiConfig,
    user_list_view::{Column, UserListView, UserRow, UserTable, show_refetch_spinner},
    users_api::{UsersPage, prefetch_user, users_page_scope},
};

/// The paginated users page. Owns the current page number, everything else comes from the query cache.
///
/// `initial_page` seeds page 1 so the first render doesn't wait on the network.
#[component]
pub fn UserList(
    #[prop(into)] is_wide: Signal<bool>,
    #[prop(optional)] initial_page: Option<UsersPage>,
) -> impl IntoView {
    let client = QueryClient::expect();
    let api = expect_context::<ApiConfig>();

    let page = RwSignal::new(1_u64);
    let users = use_query(
        &client,
        users_page_scope(api.clone()),
        move || page.get(),
        initial_page,
    );

    let on_prefetch = Callback::new(move |user_id: String| prefetch_user(&client, &api, user_id));
    let on_page_change = Callback::new(move |new_page: u64| page.set(new_page));

    let refetch_spinner = {
        let users = users.clone();
        move || show_refetch_spinner(users.is_loading(), users.is_fetching())
    };

    let content = move || {
        let view = UserListView::build(
            users.is_loading(),
            users.error().is_some(),
            users.data().as_ref(),
            is_wide.get(),
        );
        match view {
            UserListView::Loading => EitherOf3::A(view! {
                <div class="centered">
                    <Spinner />
                </div>
            }),
            UserListView::Failed { message } => EitherOf3::B(view! {
                <div class="centered">
                    <p>{message}</p>
                </div>
            }),
            UserListView::Table(table) => EitherOf3::C(view! {
                <UsersTable
                    table=table
                    current_page=page.get()
                    on_page_change=on_page_change
                    on_prefetch=on_prefetch
                />
            }),
        }
    };

    view! {
        <section class="panel">
            <div class="panel-heading">
                <h1>
                    "Users"
                    <Show when=refetch_spinner>
                        <Spinner small=true />
                    </Show>
                </h1>
                <a class="button button-primary" href="/users/create">
                    "+ Create new"
                </a>
            </div>
            {content}
        </section>
    }
}

#[component]
fn UsersTable(
    table: UserTable,
    current_page: u64,
    on_page_change: Callback<u64>,
    on_prefetch: Callback<String>,
) -> impl IntoView {
    let UserTable {
        columns,
        rows,
        total_count,
    } = table;

    view! {
        <table class="users-table">
            <thead>
                <tr>
                    {columns
                        .into_iter()
                        .map(|column| {
                            if column == Column::Select {
                                view! {
                                    <th class="col-select">
                                        <input type="checkbox" aria-label="Select all" />
                                    </th>
                                }
                                    .into_any()
                            } else {
                                view! { <th>{column.title()}</th> }.into_any()
                            }
                        })
                        .collect_view()}
                </tr>
            </thead>
            <tbody>
                {rows
                    .into_iter()
                    .map(|row| view! { <UserTableRow row=row on_prefetch=on_prefetch /> })
                    .collect_view()}
            </tbody>
        </table>
        <Pagination
            total_count=total_count
            current_page=current_page
            on_page_change=on_page_change
        />
    }
}

#[component]
fn UserTableRow(row: UserRow, on_prefetch: Callback<String>) -> impl IntoView {
    let UserRow {
        id,
        name,
        email,
        registered_at,
        show_edit,
    } = row;
    let href = format!("/users/{id}");
    let edit_href = format!("/users/{id}/edit");
    let hover_id = id.clone();
    let focus_id = id;

    view! {
        <tr>
            <td class="col-select">
                <input type="checkbox" aria-label="Select user" />
            </td>
            <td>
                <a
                    class="user-link"
                    href=href
                    on:mouseenter=move |_| on_prefetch.run(hover_id.clone())
                    on:focus=move |_| on_prefetch.run(focus_id.clone())
                >
                    <p class="user-name">{name}</p>
                    <p class="user-email">{email}</p>
                </a>
            </td>
            {registered_at.map(|registered_at| view! { <td>{registered_at}</td> })}
            {show_edit
                .then(|| {
                    view! {
                        <td>
                            <a class="button button-sm" href=edit_href>
                                "Edit"
                            </a>
                        </td>
                    }
                })}
        </tr>
    }
}
