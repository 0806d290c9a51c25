//! Per-resource managers.
//!
//! A manager sits between callers and a service: it answers reads from its
//! caches when it can, invalidates the affected entries after mutations,
//! tracks loading and error state, and publishes change events both on its
//! own bus and on the application-wide [`SyncBus`](crate::events::SyncBus).

mod auth;
mod base;
mod categories;
mod collections;
mod comments;
mod downloads;
mod followers;
mod likes;
mod photos;
mod users;

pub use auth::AuthManager;
pub use base::{ManagerEvent, ManagerState};
pub use categories::CategoriesManager;
pub use collections::CollectionsManager;
pub use comments::CommentsManager;
pub use downloads::DownloadsManager;
pub use followers::FollowersManager;
pub use likes::LikesManager;
pub use photos::PhotosManager;
pub use users::UsersManager;
