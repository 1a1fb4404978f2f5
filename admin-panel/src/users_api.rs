use std::time::Duration;

use admin_query::{QueryClient, QueryOptions, QueryScope};
use serde::{Deserialize, Serialize};

use crate::{config::ApiConfig, error::FetchError};

/// A user pages stay fresh for.
pub const USERS_PAGE_STALE_TIME: Duration = Duration::from_secs(5);
/// A prefetched user detail stays fresh for.
pub const USER_DETAIL_STALE_TIME: Duration = Duration::from_secs(60 * 10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

/// One page of users, plus the total across all pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersPage {
    pub users: Vec<User>,
    pub total_count: u64,
}

/// The single user record behind `/users/{id}`, extra server fields are ignored.
pub type UserDetail = User;

/// Renders an RFC 3339 timestamp as a long date, e.g. `02 April 2021`.
///
/// Anything else is assumed to be preformatted and kept as is.
pub fn format_created_at(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%d %B %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub async fn get_users(api: &ApiConfig, page: u64) -> Result<UsersPage, FetchError> {
    let mut users_page: UsersPage = reqwest::Client::new()
        .get(api.users_url())
        .query(&[("page", page)])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    for user in &mut users_page.users {
        user.created_at = format_created_at(&user.created_at);
    }
    tracing::debug!(page, users = users_page.users.len(), "Fetched users page.");
    Ok(users_page)
}

pub async fn get_user(api: &ApiConfig, user_id: String) -> Result<UserDetail, FetchError> {
    let mut user: UserDetail = reqwest::Client::new()
        .get(api.user_url(&user_id))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    user.created_at = format_created_at(&user.created_at);
    Ok(user)
}

/// Pages of users, keyed by page number.
pub fn users_page_scope(api: ApiConfig) -> QueryScope<u64, UsersPage, FetchError> {
    QueryScope::new("users", move |page: u64| {
        let api = api.clone();
        async move { get_users(&api, page).await }
    })
    .with_options(QueryOptions::new().with_stale_time(USERS_PAGE_STALE_TIME))
}

/// Single users, keyed by id. Independent of the pages cache.
pub fn user_detail_scope(api: ApiConfig) -> QueryScope<String, UserDetail, FetchError> {
    QueryScope::new("user", move |user_id: String| {
        let api = api.clone();
        async move { get_user(&api, user_id).await }
    })
    .with_options(QueryOptions::new().with_stale_time(USER_DETAIL_STALE_TIME))
}

/// Warm the cache for a user the operator is likely to open next.
///
/// Fire and forget: a no-op whilst the cached user is fresh, failures are only logged.
pub fn prefetch_user(client: &QueryClient, api: &ApiConfig, user_id: String) {
    let client = client.clone();
    let scope = user_detail_scope(api.clone());
    leptos::task::spawn_local(async move {
        client.prefetch_query(&scope, user_id).await;
    });
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    #[case("2021-04-02T10:00:00Z", "02 April 2021")]
    #[case("2021-12-31T23:30:00-03:00", "31 December 2021")]
    #[case("02 de abril de 2021", "02 de abril de 2021")]
    #[case("", "")]
    fn test_format_created_at(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(format_created_at(raw), expected);
    }

    #[test]
    fn test_decode_users_page() {
        let body = r#"{
            "users": [
                {"id": "1", "name": "Ada", "email": "ada@example.com", "createdAt": "2021-04-02T10:00:00Z"},
                {"id": "2", "name": "Grace", "email": "grace@example.com", "createdAt": "2021-04-03T10:00:00Z"}
            ],
            "totalCount": 25
        }"#;
        let page: UsersPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_count, 25);
        assert_eq!(
            page.users.iter().map(|user| user.id.as_str()).collect::<Vec<_>>(),
            ["1", "2"]
        );
        assert_eq!(page.users[1].email, "grace@example.com");
    }

    #[test]
    fn test_decode_user_detail_ignores_extra_fields() {
        let body = r#"{"id": "7", "name": "Linus", "email": "linus@example.com", "createdAt": "x", "role": "admin"}"#;
        let user: UserDetail = serde_json::from_str(body).unwrap();
        assert_eq!(user.name, "Linus");
    }

    #[test]
    fn test_scopes_are_independent() {
        let api = ApiConfig::new("http://localhost:3000/api");
        let client = QueryClient::new();
        let pages = users_page_scope(api.clone());
        let users = user_detail_scope(api);
        assert_ne!(pages.name(), users.name());
        assert_eq!(
            users.options().stale_time(),
            Duration::from_secs(600)
        );

        client.set_query(
            &pages,
            1,
            UsersPage {
                users: vec![],
                total_count: 0,
            },
        );
        assert!(!client.query_exists(&users, "1".to_string()));
        assert!(client.query_exists(&pages, 1));
    }
}
