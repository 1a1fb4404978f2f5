mod header;
mod pagination;
mod profile;
mod sidebar;
mod spinner;
mod user_list;

pub use header::Header;
pub use pagination::Pagination;
pub use profile::Profile;
pub use sidebar::Sidebar;
pub use spinner::Spinner;
pub use user_list::UserList;
