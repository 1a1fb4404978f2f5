//! The user list as plain data, computed from the query state and the viewport, then rendered by the components.

use crate::users_api::UsersPage;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load users.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Select,
    User,
    RegisteredAt,
    Actions,
}

impl Column {
    pub fn title(self) -> &'static str {
        match self {
            Column::Select | Column::Actions => "",
            Column::User => "User",
            Column::RegisteredAt => "Registered at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Only set on wide viewports.
    pub registered_at: Option<String>,
    pub show_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTable {
    pub columns: Vec<Column>,
    pub rows: Vec<UserRow>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserListView {
    Loading,
    Failed { message: &'static str },
    Table(UserTable),
}

impl UserListView {
    /// Loading wins over a failure, a failure wins over whatever data is around.
    pub fn build(is_loading: bool, failed: bool, data: Option<&UsersPage>, is_wide: bool) -> Self {
        if is_loading {
            return UserListView::Loading;
        }
        if failed {
            return UserListView::Failed {
                message: LOAD_FAILED_MESSAGE,
            };
        }
        let Some(data) = data else {
            // Nothing requested yet.
            return UserListView::Loading;
        };

        let mut columns = vec![Column::Select, Column::User];
        if is_wide {
            columns.extend([Column::RegisteredAt, Column::Actions]);
        }
        let rows = data
            .users
            .iter()
            .map(|user| UserRow {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                registered_at: is_wide.then(|| user.created_at.clone()),
                show_edit: is_wide,
            })
            .collect();

        UserListView::Table(UserTable {
            columns,
            rows,
            total_count: data.total_count,
        })
    }
}

/// The small heading spinner, only for refetches behind data already on screen.
pub fn show_refetch_spinner(is_loading: bool, is_fetching: bool) -> bool {
    !is_loading && is_fetching
}
