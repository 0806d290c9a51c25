//! One service per resource: sends the request built by [`crate::requests`]
//! and prefixes failures with what was being attempted.
//!
//! Services hold no state besides the client and never cache.

mod auth;
mod categories;
mod collections;
mod comments;
mod downloads;
mod followers;
mod likes;
mod photos;
mod users;

pub use auth::AuthService;
pub use categories::CategoriesService;
pub use collections::CollectionsService;
pub use comments::CommentsService;
pub use downloads::DownloadsService;
pub use followers::FollowersService;
pub use likes::LikesService;
pub use photos::PhotosService;
pub use users::UsersService;

use crate::error::ApiResult;

/// Attach context to a failed call, keeping kind, status and payload.
pub(crate) trait ResultExt<T> {
  fn context(self, what: &str) -> ApiResult<T>;
}

impl<T> ResultExt<T> for ApiResult<T> {
  fn context(self, what: &str) -> ApiResult<T> {
    self.map_err(|e| e.context(what))
  }
}
