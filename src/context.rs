//! The application context: one client, one set of managers.

use color_eyre::Result;
use std::sync::Arc;

use crate::cache::CacheLayer;
use crate::config::Config;
use crate::credentials::{MemoryTokenStore, SqliteTokenStore, TokenStore};
use crate::events::SyncBus;
use crate::http::{ApiClient, ReqwestTransport};
use crate::managers::{
  AuthManager, CategoriesManager, CollectionsManager, CommentsManager, DownloadsManager,
  FollowersManager, LikesManager, PhotosManager, UsersManager,
};
use crate::services::{
  AuthService, CategoriesService, CollectionsService, CommentsService, DownloadsService,
  FollowersService, LikesService, PhotosService, UsersService,
};

/// Owns the HTTP client, the credential store and every manager.
///
/// Everything shares one [`SyncBus`] and one token store, so a refresh or
/// an expired session done through one manager is seen by all of them.
pub struct Pictura {
  client: ApiClient,
  pub auth: AuthManager,
  pub users: UsersManager,
  pub photos: PhotosManager,
  pub collections: CollectionsManager,
  pub categories: CategoriesManager,
  pub comments: CommentsManager,
  pub likes: LikesManager,
  pub downloads: DownloadsManager,
  pub followers: FollowersManager,
}

impl Pictura {
  pub fn new(config: &Config) -> Result<Self> {
    let tokens: Arc<dyn TokenStore> = if config.credentials.in_memory {
      Arc::new(MemoryTokenStore::new())
    } else {
      let path = match &config.credentials.path {
        Some(path) => path.clone(),
        None => SqliteTokenStore::default_path()?,
      };
      Arc::new(SqliteTokenStore::open(&path)?)
    };

    let transport = ReqwestTransport::new(&config.api)?;
    let client = ApiClient::new(Arc::new(transport), tokens, SyncBus::new())
      .with_retry_policy(config.retry.policy());

    let layer = match config.stale_after() {
      Some(stale) => CacheLayer::new().with_stale_time(stale),
      None => CacheLayer::new(),
    };

    tracing::debug!(base_url = %config.api.base_url, "client context ready");
    Ok(Self::with_client(client, layer))
  }

  /// Build every manager on top of an existing client.
  pub fn with_client(client: ApiClient, layer: CacheLayer) -> Self {
    let sync = client.sync().clone();
    Self {
      auth: AuthManager::new(client.clone(), AuthService::new(client.clone())),
      users: UsersManager::new(UsersService::new(client.clone()), sync.clone(), layer),
      photos: PhotosManager::new(PhotosService::new(client.clone()), sync.clone(), layer),
      collections: CollectionsManager::new(CollectionsService::new(client.clone()), sync.clone(), layer),
      categories: CategoriesManager::new(CategoriesService::new(client.clone()), sync.clone(), layer),
      comments: CommentsManager::new(CommentsService::new(client.clone()), sync.clone(), layer),
      likes: LikesManager::new(LikesService::new(client.clone()), sync.clone(), layer),
      downloads: DownloadsManager::new(DownloadsService::new(client.clone()), sync.clone(), layer),
      followers: FollowersManager::new(FollowersService::new(client.clone()), sync, layer),
      client,
    }
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  pub fn sync(&self) -> &SyncBus {
    self.client.sync()
  }

  /// Drop every cache and recorded error. Subscribers and stored
  /// credentials are kept.
  pub fn reset(&self) {
    self.users.reset();
    self.photos.reset();
    self.collections.reset();
    self.categories.reset();
    self.comments.reset();
    self.likes.reset();
    self.downloads.reset();
    self.followers.reset();
    self.auth.state().reset();
  }

  /// Log out and forget everything cached for the previous session.
  pub async fn logout(&self) -> crate::ApiResult<()> {
    let result = self.auth.logout().await;
    self.reset();
    result
  }
}
