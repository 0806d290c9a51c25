use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore, Scope};
use crate::error::{ApiError, ApiResult};
use crate::events::{SyncBus, SyncEvent};
use crate::models::{Notification, Page, ResourceId, Stats, UserProfile, UserSummary};
use crate::params::QueryParams;
use crate::requests::users::{PasswordChange, ProfileUpdate};
use crate::services::UsersService;
use crate::validation;

const PROFILE: &str = "user_profile";
const BY_ID: &str = "user_by_id";
const STATS: &str = "user_stats";
const FOLLOWERS: &str = "user_followers";
const FOLLOWING: &str = "user_following";
const SUGGESTED: &str = "user_suggestions";
const NOTIFICATIONS: &str = "notifications";

pub struct UsersManager {
  service: UsersService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  profiles: CacheStore<UserProfile>,
  stats: CacheStore<Stats>,
  people: CacheStore<Page<UserSummary>>,
  notifications: CacheStore<Page<Notification>>,
}

impl UsersManager {
  pub fn new(service: UsersService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("users"),
      profiles: CacheStore::new(),
      stats: CacheStore::new(),
      people: CacheStore::new(),
      notifications: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn get_user_profile(&self, username: &str) -> ApiResult<UserProfile> {
    self
      .state
      .cached(
        &self.layer,
        &self.profiles,
        CacheKey::record(PROFILE, username),
        self.service.get_user_profile(username),
      )
      .await
  }

  pub async fn get_user_by_id(&self, id: &ResourceId) -> ApiResult<UserProfile> {
    self
      .state
      .cached(
        &self.layer,
        &self.profiles,
        CacheKey::record(BY_ID, id),
        self.service.get_user_by_id(id),
      )
      .await
  }

  /// Send a profile change, avatar included when set. Invalid fields are
  /// rejected before any request goes out.
  pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
    self
      .state
      .track(async {
        validation::validate_profile(update).map_err(ApiError::from)?;
        let profile = self.service.update_profile(update).await?;

        if update.username.is_some() {
          // the old handle is unknown here
          self.profiles.invalidate_kind(PROFILE);
        }
        self
          .profiles
          .insert(CacheKey::record(PROFILE, &profile.username), profile.clone());
        if let Some(id) = &profile.id {
          self.profiles.insert(CacheKey::record(BY_ID, id), profile.clone());
        }
        self.stats.remove(&CacheKey::record(STATS, &profile.username));

        let payload = serde_json::to_value(&profile).unwrap_or(Value::Null);
        self.state.emit(ManagerEvent::Updated, payload.clone());
        self.sync.notify(SyncEvent::UserUpdated, payload);
        Ok(profile)
      })
      .await
  }

  pub async fn change_password(&self, change: &PasswordChange) -> ApiResult<()> {
    self.state.track(self.service.change_password(change)).await
  }

  pub async fn get_user_stats(&self, username: &str) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(STATS, username),
        self.service.get_user_stats(username),
      )
      .await
  }

  pub async fn get_followers(&self, username: &str, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .state
      .cached(
        &self.layer,
        &self.people,
        CacheKey::new(Scope::of(FOLLOWERS, username), params.clone()),
        self.service.get_followers(username, params),
      )
      .await
  }

  pub async fn get_following(&self, username: &str, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .state
      .cached(
        &self.layer,
        &self.people,
        CacheKey::new(Scope::of(FOLLOWING, username), params.clone()),
        self.service.get_following(username, params),
      )
      .await
  }

  pub async fn get_suggested_users(&self, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self
      .state
      .cached(
        &self.layer,
        &self.people,
        CacheKey::new(Scope::global(SUGGESTED), params.clone()),
        self.service.get_suggested_users(params),
      )
      .await
  }

  /// Always goes to the server.
  pub async fn search_users(&self, query: &str, params: &QueryParams) -> ApiResult<Page<UserSummary>> {
    self.state.track(self.service.search_users(query, params)).await
  }

  pub async fn get_notifications(&self, params: &QueryParams) -> ApiResult<Page<Notification>> {
    self
      .state
      .cached(
        &self.layer,
        &self.notifications,
        CacheKey::new(Scope::global(NOTIFICATIONS), params.clone()),
        self.service.get_notifications(params),
      )
      .await
  }

  pub async fn mark_notifications_read(&self, ids: &[ResourceId]) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.mark_notifications_read(ids).await?;
        self.notifications.invalidate_kind(NOTIFICATIONS);
        self
          .state
          .emit(ManagerEvent::Updated, json!({ "notification_ids": ids }));
        Ok(())
      })
      .await
  }

  /// Delete the logged-in account and forget everything cached about it.
  pub async fn delete_account(&self) -> ApiResult<()> {
    self.state.track(self.service.delete_account()).await?;
    self.state.emit(ManagerEvent::Deleted, Value::Null);
    self.reset();
    Ok(())
  }

  pub fn reset(&self) {
    self.profiles.clear();
    self.stats.clear();
    self.people.clear();
    self.notifications.clear();
    self.state.reset();
  }
}
