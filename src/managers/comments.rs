use serde_json::{json, Value};

use super::base::{ManagerEvent, ManagerState};
use crate::cache::{CacheKey, CacheLayer, CacheStore, Scope};
use crate::error::ApiResult;
use crate::events::{SyncBus, SyncEvent};
use crate::models::{Comment, Page, ResourceId, Stats};
use crate::params::PageRequest;
use crate::requests::comments::COMMENTS_PAGE_SIZE;
use crate::services::CommentsService;

const RECORD: &str = "comment";
const PHOTO_COMMENTS: &str = "photo_comments";
const USER_COMMENTS: &str = "user_comments";
const RECENT: &str = "recent_comments";
const STATS: &str = "comment_stats";
const USER_STATS: &str = "user_comment_stats";

/// Comments cache is invalidated on every mutation and never patched in
/// place, so thread order and counters always come from the server.
pub struct CommentsManager {
  service: CommentsService,
  sync: SyncBus,
  layer: CacheLayer,
  state: ManagerState,
  by_id: CacheStore<Comment>,
  threads: CacheStore<Page<Comment>>,
  stats: CacheStore<Stats>,
}

impl CommentsManager {
  pub fn new(service: CommentsService, sync: SyncBus, layer: CacheLayer) -> Self {
    Self {
      service,
      sync,
      layer,
      state: ManagerState::new("comments"),
      by_id: CacheStore::new(),
      threads: CacheStore::new(),
      stats: CacheStore::new(),
    }
  }

  pub fn state(&self) -> &ManagerState {
    &self.state
  }

  pub async fn get_photo_comments(&self, photo_id: &ResourceId, page: u32) -> ApiResult<Page<Comment>> {
    let page = PageRequest::new(page, COMMENTS_PAGE_SIZE);
    self
      .state
      .cached(
        &self.layer,
        &self.threads,
        CacheKey::page(PHOTO_COMMENTS, photo_id, page),
        self.service.get_photo_comments(photo_id, page),
      )
      .await
  }

  pub async fn get_comment(&self, id: &ResourceId) -> ApiResult<Comment> {
    self
      .state
      .cached(
        &self.layer,
        &self.by_id,
        CacheKey::record(RECORD, id),
        self.service.get_comment(id),
      )
      .await
  }

  pub async fn add_comment(&self, photo_id: &ResourceId, text: &str) -> ApiResult<Comment> {
    self
      .state
      .track(async {
        let comment = self.service.add_comment(photo_id, text).await?;
        self.invalidate(Some(photo_id), author_of(&comment).as_ref());
        self.announce(ManagerEvent::Created, SyncEvent::CommentCreated, &comment);
        Ok(comment)
      })
      .await
  }

  pub async fn update_comment(&self, id: &ResourceId, text: &str) -> ApiResult<Comment> {
    self
      .state
      .track(async {
        let comment = self.service.update_comment(id, text).await?;
        self.by_id.remove(&CacheKey::record(RECORD, id));
        self.invalidate(comment.photo.as_ref(), author_of(&comment).as_ref());
        self.announce(ManagerEvent::Updated, SyncEvent::CommentUpdated, &comment);
        Ok(comment)
      })
      .await
  }

  pub async fn delete_comment(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        let known = self.by_id.get_value(&CacheKey::record(RECORD, id));
        self.service.delete_comment(id).await?;
        self.by_id.remove(&CacheKey::record(RECORD, id));

        let photo = known.as_ref().and_then(|c| c.photo.clone());
        let author = known.as_ref().and_then(author_of);
        self.invalidate(photo.as_ref(), author.as_ref());

        let payload = json!({ "id": id, "photo_id": photo });
        self.state.emit(ManagerEvent::Deleted, payload.clone());
        self.sync.notify(SyncEvent::CommentDeleted, payload);
        Ok(())
      })
      .await
  }

  pub async fn get_user_comments(&self, user_id: &ResourceId) -> ApiResult<Page<Comment>> {
    self
      .state
      .cached(
        &self.layer,
        &self.threads,
        CacheKey::record(USER_COMMENTS, user_id),
        self.service.get_user_comments(user_id),
      )
      .await
  }

  pub async fn get_stats(&self, photo_id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(STATS, photo_id),
        self.service.get_stats(photo_id),
      )
      .await
  }

  pub async fn get_recent(&self) -> ApiResult<Page<Comment>> {
    self
      .state
      .cached(&self.layer, &self.threads, CacheKey::global(RECENT), self.service.get_recent())
      .await
  }

  pub async fn get_user_stats(&self, user_id: &ResourceId) -> ApiResult<Stats> {
    self
      .state
      .cached(
        &self.layer,
        &self.stats,
        CacheKey::record(USER_STATS, user_id),
        self.service.get_user_stats(user_id),
      )
      .await
  }

  pub async fn report_comment(&self, id: &ResourceId, reason: &str) -> ApiResult<()> {
    self
      .state
      .track(self.service.report_comment(id, reason))
      .await
  }

  pub async fn like_comment(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.like_comment(id).await?;
        self.touch(id);
        Ok(())
      })
      .await
  }

  pub async fn unlike_comment(&self, id: &ResourceId) -> ApiResult<()> {
    self
      .state
      .track(async {
        self.service.unlike_comment(id).await?;
        self.touch(id);
        Ok(())
      })
      .await
  }

  pub fn reset(&self) {
    self.by_id.clear();
    self.threads.clear();
    self.stats.clear();
    self.state.reset();
  }

  /// Drop what a change to one comment can affect. An unknown photo or
  /// author widens the drop to every entry of that kind.
  fn invalidate(&self, photo_id: Option<&ResourceId>, author: Option<&ResourceId>) {
    match photo_id {
      Some(photo_id) => {
        self.threads.invalidate_scope(&Scope::of(PHOTO_COMMENTS, photo_id));
        self.stats.remove(&CacheKey::record(STATS, photo_id));
      }
      None => {
        self.threads.invalidate_kind(PHOTO_COMMENTS);
        self.stats.invalidate_kind(STATS);
      }
    }
    match author {
      Some(author) => {
        self.threads.remove(&CacheKey::record(USER_COMMENTS, author));
        self.stats.remove(&CacheKey::record(USER_STATS, author));
      }
      None => {
        self.threads.invalidate_kind(USER_COMMENTS);
        self.stats.invalidate_kind(USER_STATS);
      }
    }
    self.threads.remove(&CacheKey::global(RECENT));
  }

  /// A like changes the comment's counters wherever it is listed.
  fn touch(&self, id: &ResourceId) {
    let known = self.by_id.get_value(&CacheKey::record(RECORD, id));
    self.by_id.remove(&CacheKey::record(RECORD, id));
    let photo = known.as_ref().and_then(|c| c.photo.clone());
    let author = known.as_ref().and_then(author_of);
    self.invalidate(photo.as_ref(), author.as_ref());
    self.sync.notify(SyncEvent::CommentUpdated, json!({ "id": id }));
  }

  fn announce(&self, event: ManagerEvent, sync: SyncEvent, comment: &Comment) {
    let payload = serde_json::to_value(comment).unwrap_or(Value::Null);
    self.state.emit(event, payload.clone());
    self.sync.notify(sync, payload);
  }
}

fn author_of(comment: &Comment) -> Option<ResourceId> {
  comment.user.as_ref().and_then(|user| user.id())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::session_for;
  use pretty_assertions::assert_eq;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn manager(server: &MockServer) -> CommentsManager {
    let client = session_for(server);
    CommentsManager::new(CommentsService::new(client.clone()), client.sync().clone(), CacheLayer::new())
  }

  #[tokio::test]
  async fn test_photo_comments_paged_by_twenty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/comments/photo/5/"))
      .and(query_param("page", "2"))
      .and(query_param("page_size", "20"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 21, "results": [
        {"id": 21, "photo": 5, "comment_text": "last"}
      ]})))
      .expect(1)
      .mount(&server)
      .await;

    let comments = manager(&server);
    let page = comments.get_photo_comments(&ResourceId::Int(5), 2).await.unwrap();
    assert_eq!(page.results[0].comment_text, "last");
    comments.get_photo_comments(&ResourceId::Int(5), 2).await.unwrap();
  }

  #[tokio::test]
  async fn test_new_comment_refreshes_thread_stats_and_recent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/comments/photo/5/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/comments/stats/5/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_comments": 0})))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/comments/recent/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/comments/stats/6/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_comments": 4})))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/comments/"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({
        "id": 40, "photo": 5, "user": {"id": 2, "username": "ana"}, "comment_text": "nice"
      })))
      .expect(1)
      .mount(&server)
      .await;

    let comments = manager(&server);
    let photo = ResourceId::Int(5);
    let other = ResourceId::Int(6);

    comments.get_photo_comments(&photo, 1).await.unwrap();
    comments.get_stats(&photo).await.unwrap();
    comments.get_stats(&other).await.unwrap();
    comments.get_recent().await.unwrap();

    let created = comments.add_comment(&photo, "nice").await.unwrap();
    assert_eq!(created.id, ResourceId::Int(40));

    comments.get_photo_comments(&photo, 1).await.unwrap();
    comments.get_stats(&photo).await.unwrap();
    comments.get_recent().await.unwrap();
    // other photos keep their entries
    comments.get_stats(&other).await.unwrap();
  }

  #[tokio::test]
  async fn test_delete_uses_cached_comment_to_scope_invalidation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/comments/9/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": 9, "photo": 5, "user": 2, "comment_text": "old"
      })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/comments/9/"))
      .respond_with(ResponseTemplate::new(204))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/comments/user/2/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(2)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/comments/user/3/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let comments = manager(&server);
    comments.get_comment(&ResourceId::Int(9)).await.unwrap();
    comments.get_user_comments(&ResourceId::Int(2)).await.unwrap();
    comments.get_user_comments(&ResourceId::Int(3)).await.unwrap();

    comments.delete_comment(&ResourceId::Int(9)).await.unwrap();

    comments.get_user_comments(&ResourceId::Int(2)).await.unwrap();
    comments.get_user_comments(&ResourceId::Int(3)).await.unwrap();
  }
}
