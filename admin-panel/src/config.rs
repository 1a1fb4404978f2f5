use crate::breakpoint::Breakpoint;

/// Records per page, the server pages with the same size.
pub const PAGE_SIZE: u64 = 10;

/// How many page numbers to show either side of the current one.
pub const SIBLINGS_COUNT: u64 = 1;

/// Below this width the table drops its registration date and action columns.
pub const WIDE_BREAKPOINT: Breakpoint = Breakpoint::Lg;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Where the user records are served from.
///
/// Baked in at build time from `ADMIN_PANEL_API_URL`, falling back to [`DEFAULT_API_URL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(option_env!("ADMIN_PANEL_API_URL").unwrap_or(DEFAULT_API_URL))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    pub fn user_url(&self, user_id: &str) -> String {
        format!("{}/users/{user_id}", self.base_url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// The signed in operator shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorProfile {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl OperatorProfile {
    pub fn from_env() -> Self {
        Self {
            name: option_env!("ADMIN_PANEL_OPERATOR_NAME")
                .unwrap_or("Admin")
                .to_string(),
            email: option_env!("ADMIN_PANEL_OPERATOR_EMAIL")
                .unwrap_or("admin@example.com")
                .to_string(),
            avatar_url: option_env!("ADMIN_PANEL_OPERATOR_AVATAR").map(str::to_string),
        }
    }

    /// Up to two uppercase initials, the avatar fallback when there's no picture.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}
