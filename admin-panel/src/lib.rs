pub mod app;
pub mod breakpoint;
pub mod components;
pub mod config;
pub mod error;
pub mod pagination;
pub mod user_list_view;
pub mod users_api;
