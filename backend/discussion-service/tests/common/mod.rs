//! In-memory doubles for the discussion service seams.
#![allow(dead_code)]

use async_trait::async_trait;
use discussion_service::clients::{AssetDirectory, AssetSummary, ForumClient, UserDirectory};
use discussion_service::db::CategoryStore;
use discussion_service::events::{EmailNotification, EventPublisher, ModerationRequest};
use discussion_service::middleware::JwtValidator;
use discussion_service::models::{
    DiscourseCategory, DiscoursePost, DiscourseTopic, PlatformUser,
};
use discussion_service::{AppError, DiscussionService, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const PRIVATE_KEY: &str = include_str!("../fixtures/jwt_private.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/jwt_public.pem");
/// Key pair the service does not trust.
pub const UNTRUSTED_PRIVATE_KEY: &str = include_str!("../fixtures/jwt_untrusted_private.pem");

// =====================================================================
// Forum
// =====================================================================

#[derive(Default)]
pub struct ForumState {
    pub categories: HashMap<i64, DiscourseCategory>,
    pub topics: HashMap<i64, DiscourseTopic>,
    pub posts: HashMap<i64, DiscoursePost>,
    pub ensured_users: Vec<String>,
    pub created_category_names: Vec<String>,
    pub deleted_topics: Vec<i64>,
    next_id: i64,
}

impl ForumState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct FakeForum {
    pub state: Mutex<ForumState>,
    pub healthy: AtomicBool,
}

impl Default for FakeForum {
    fn default() -> Self {
        Self {
            state: Mutex::new(ForumState {
                next_id: 100,
                ..Default::default()
            }),
            healthy: AtomicBool::new(true),
        }
    }
}

fn not_found(what: &str, id: i64) -> AppError {
    AppError::ForumRequest(format!("Discourse answered 404 during {} {}", what, id))
}

fn make_post(id: i64, topic_id: i64, username: &str, raw: &str) -> DiscoursePost {
    DiscoursePost {
        id,
        name: Some(format!("{} name", username)),
        username: username.to_string(),
        avatar_template: format!("/letter_avatar_proxy/v4/letter/{}/{{size}}.png", &username[..1]),
        created_at: "2024-10-28T09:56:31.639Z".to_string(),
        cooked: format!("<p>{}</p>", raw),
        post_number: 1,
        topic_id,
        display_username: None,
        user_id: 10,
        updated_at: None,
    }
}

impl FakeForum {
    pub fn add_category(&self, name: &str) -> DiscourseCategory {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let category = DiscourseCategory {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace('_', "-"),
            color: Some("0088CC".to_string()),
            text_color: Some("FFFFFF".to_string()),
            topic_count: 0,
            post_count: 0,
            position: Some(1),
            description: None,
            read_restricted: false,
        };
        state.categories.insert(id, category.clone());
        category
    }

    /// Returns `(topic_id, first_post_id)`.
    pub fn add_topic(&self, category_id: i64, title: &str, username: &str) -> (i64, i64) {
        let mut state = self.state.lock().unwrap();
        let topic_id = state.next_id();
        let post_id = state.next_id();
        state.topics.insert(
            topic_id,
            DiscourseTopic {
                id: topic_id,
                title: title.to_string(),
                fancy_title: title.to_string(),
                slug: title.to_lowercase().replace(' ', "-"),
                posts_count: 1,
                reply_count: 0,
                highest_post_number: 1,
                created_at: "2024-10-28T09:56:31.565Z".to_string(),
                last_posted_at: None,
                category_id,
                visible: true,
                closed: false,
                archived: false,
                pinned: false,
                views: 0,
                like_count: 0,
                username: Some(username.to_string()),
            },
        );
        state
            .posts
            .insert(post_id, make_post(post_id, topic_id, username, "first post"));
        (topic_id, post_id)
    }

    pub fn ensured_users(&self) -> Vec<String> {
        self.state.lock().unwrap().ensured_users.clone()
    }

    pub fn deleted_topics(&self) -> Vec<i64> {
        self.state.lock().unwrap().deleted_topics.clone()
    }

    pub fn post(&self, post_id: i64) -> Option<DiscoursePost> {
        self.state.lock().unwrap().posts.get(&post_id).cloned()
    }
}

#[async_trait]
impl ForumClient for FakeForum {
    async fn ensure_user(&self, user: &PlatformUser) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .ensured_users
            .push(user.username.clone());
        Ok(())
    }

    async fn get_category(&self, category_id: i64) -> Result<Option<DiscourseCategory>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .categories
            .get(&category_id)
            .cloned())
    }

    async fn create_category(&self, name: &str) -> Result<DiscourseCategory> {
        self.state
            .lock()
            .unwrap()
            .created_category_names
            .push(name.to_string());
        Ok(self.add_category(name))
    }

    async fn list_topics(&self, _slug: &str, category_id: i64) -> Result<Vec<DiscourseTopic>> {
        let state = self.state.lock().unwrap();
        if !state.categories.contains_key(&category_id) {
            return Err(AppError::ResourceUnavailable);
        }
        let mut topics: Vec<DiscourseTopic> = state
            .topics
            .values()
            .filter(|t| t.category_id == category_id)
            .cloned()
            .collect();
        topics.sort_by_key(|t| t.id);
        Ok(topics)
    }

    async fn create_topic(
        &self,
        username: &str,
        category_id: i64,
        title: &str,
        raw: &str,
    ) -> Result<DiscoursePost> {
        let (topic_id, post_id) = self.add_topic(category_id, title, username);
        let mut state = self.state.lock().unwrap();
        let post = make_post(post_id, topic_id, username, raw);
        state.posts.insert(post_id, post.clone());
        Ok(post)
    }

    async fn create_post(&self, username: &str, topic_id: i64, raw: &str) -> Result<DiscoursePost> {
        let mut state = self.state.lock().unwrap();
        if !state.topics.contains_key(&topic_id) {
            return Err(not_found("post creation", topic_id));
        }
        let id = state.next_id();
        let mut post = make_post(id, topic_id, username, raw);
        post.post_number = 2;
        state.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_topic(&self, topic_id: i64) -> Result<DiscourseTopic> {
        self.state
            .lock()
            .unwrap()
            .topics
            .get(&topic_id)
            .cloned()
            .ok_or_else(|| not_found("topic", topic_id))
    }

    async fn get_topic_with_posts(
        &self,
        topic_id: i64,
    ) -> Result<(DiscourseTopic, Vec<DiscoursePost>)> {
        let topic = self.get_topic(topic_id).await?;
        let state = self.state.lock().unwrap();
        let mut posts: Vec<DiscoursePost> = state
            .posts
            .values()
            .filter(|p| p.topic_id == topic_id)
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.id);
        Ok((topic, posts))
    }

    async fn get_post(&self, post_id: i64) -> Result<DiscoursePost> {
        self.post(post_id).ok_or_else(|| not_found("post", post_id))
    }

    async fn edit_post(&self, post_id: i64, raw: &str) -> Result<DiscoursePost> {
        let mut state = self.state.lock().unwrap();
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| not_found("post edition", post_id))?;
        post.cooked = format!("<p>{}</p>", raw);
        Ok(post.clone())
    }

    async fn delete_topic(&self, topic_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .topics
            .remove(&topic_id)
            .ok_or_else(|| not_found("topic deletion", topic_id))?;
        state.deleted_topics.push(topic_id);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::ForumUnavailable("connection refused".to_string()))
        }
    }
}

// =====================================================================
// Category mapping
// =====================================================================

#[derive(Default)]
pub struct MemoryCategoryStore {
    pub mappings: Mutex<HashMap<Uuid, i64>>,
    /// Mapping another request binds right before ours, keyed by asset.
    pub concurrent_binds: Mutex<HashMap<Uuid, i64>>,
}

impl MemoryCategoryStore {
    pub fn insert(&self, asset_id: Uuid, category_id: i64) {
        self.mappings.lock().unwrap().insert(asset_id, category_id);
    }

    pub fn get(&self, asset_id: Uuid) -> Option<i64> {
        self.mappings.lock().unwrap().get(&asset_id).copied()
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn category_for_asset(&self, asset_id: Uuid) -> Result<Option<i64>> {
        Ok(self.get(asset_id))
    }

    async fn save_category(&self, asset_id: Uuid, category_id: i64) -> Result<()> {
        self.insert(asset_id, category_id);
        Ok(())
    }

    async fn bind_category(&self, asset_id: Uuid, category_id: i64) -> Result<i64> {
        let concurrent = self.concurrent_binds.lock().unwrap().remove(&asset_id);
        let mut mappings = self.mappings.lock().unwrap();
        if let Some(other) = concurrent {
            mappings.entry(asset_id).or_insert(other);
        }
        Ok(*mappings.entry(asset_id).or_insert(category_id))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// =====================================================================
// Platform directories
// =====================================================================

#[derive(Default)]
pub struct StaticAssets {
    pub assets: Mutex<HashMap<Uuid, AssetSummary>>,
}

impl StaticAssets {
    pub fn insert(&self, asset_id: Uuid, owner_id: &str, name: &str) {
        self.assets.lock().unwrap().insert(
            asset_id,
            AssetSummary {
                owner_id: owner_id.to_string(),
                name: name.to_string(),
            },
        );
    }
}

#[async_trait]
impl AssetDirectory for StaticAssets {
    async fn asset_summary(&self, asset_id: Uuid) -> Result<AssetSummary> {
        self.assets
            .lock()
            .unwrap()
            .get(&asset_id)
            .cloned()
            .ok_or_else(|| AppError::UpstreamService {
                service: "asset-management",
                message: format!("asset {} not found", asset_id),
            })
    }
}

#[derive(Default)]
pub struct StaticUsers {
    pub emails: Mutex<HashMap<String, String>>,
}

impl StaticUsers {
    pub fn insert(&self, user_id: &str, email: &str) {
        self.emails
            .lock()
            .unwrap()
            .insert(user_id.to_string(), email.to_string());
    }
}

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn email_for_user(&self, user_id: &str) -> Result<String> {
        self.emails
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::UpstreamService {
                service: "auth",
                message: format!("profile {} not found", user_id),
            })
    }
}

// =====================================================================
// Events
// =====================================================================

#[derive(Default)]
pub struct RecordingPublisher {
    pub moderation: Mutex<Vec<ModerationRequest>>,
    pub notifications: Mutex<Vec<EmailNotification>>,
}

impl RecordingPublisher {
    pub fn moderation(&self) -> Vec<ModerationRequest> {
        self.moderation.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<EmailNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_moderation(&self, request: &ModerationRequest) -> Result<()> {
        self.moderation.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn publish_notification(&self, notification: &EmailNotification) -> Result<()> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// =====================================================================
// Wiring
// =====================================================================

pub struct TestContext {
    pub forum: Arc<FakeForum>,
    pub categories: Arc<MemoryCategoryStore>,
    pub assets: Arc<StaticAssets>,
    pub users: Arc<StaticUsers>,
    pub events: Arc<RecordingPublisher>,
    pub service: DiscussionService,
}

impl TestContext {
    pub fn new() -> Self {
        let forum = Arc::new(FakeForum::default());
        let categories = Arc::new(MemoryCategoryStore::default());
        let assets = Arc::new(StaticAssets::default());
        let users = Arc::new(StaticUsers::default());
        let events = Arc::new(RecordingPublisher::default());

        let service = DiscussionService::new(
            forum.clone(),
            categories.clone(),
            assets.clone(),
            users.clone(),
            events.clone(),
        );

        Self {
            forum,
            categories,
            assets,
            users,
            events,
            service,
        }
    }
}

pub fn platform_user(id: &str, username: &str, roles: &[&str]) -> PlatformUser {
    PlatformUser {
        id: id.to_string(),
        username: username.to_string(),
        display_name: format!("{} display", username),
        email: format!("{}@example.org", username),
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn validator() -> Arc<JwtValidator> {
    Arc::new(JwtValidator::from_public_key_pem(Some(PUBLIC_KEY)).expect("fixture key parses"))
}

/// RS256 access token for `user`, valid for one hour.
pub fn token_for(user: &PlatformUser) -> String {
    signed_token(user, PRIVATE_KEY, 3600)
}

/// RS256 token signed with `private_key_pem`, expiring `expires_in` seconds from now.
pub fn signed_token(user: &PlatformUser, private_key_pem: &str, expires_in: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": user.id,
        "iat": now,
        "exp": now + expires_in,
        "username": user.username,
        "email": user.email,
        "display_name": user.display_name,
        "roles": user.roles,
    });
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).expect("fixture key parses");
    encode(&Header::new(Algorithm::RS256), &claims, &key).expect("token encodes")
}

pub fn bearer(user: &PlatformUser) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user)))
}
