/// Discussion orchestration
///
/// Ties the forum engine, the asset → category mapping, the platform directories and the event
/// pipelines together. Handlers stay thin and call exactly one method here.
use crate::clients::{AssetDirectory, ForumClient, UserDirectory};
use crate::db::CategoryStore;
use crate::error::{AppError, Result};
use crate::events::{EmailNotification, EmailTemplate, EventPublisher, ModerationRequest};
use crate::metrics::CATEGORIES_CREATED_TOTAL;
use crate::models::{
    CreatePostBody, CreateTopicBody, DiscourseCategory, DiscussionPostResponse,
    DiscussionResponse, DiscussionTopicResponse, EditPostBody, MessageResponse, PlatformUser,
    TopicsResponse,
};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Asset id the platform's stand-alone posts feature files its topics under.
pub const STANDALONE_POST_ASSET_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_1111_1111_1111);

pub const TOPIC_DELETED_MESSAGE: &str = "Topic deleted successfully";
pub const TOPIC_MODERATED_MESSAGE: &str = "Topic moderated successfully";
pub const DELETE_FORBIDDEN_MESSAGE: &str = "Only the topic owner or admin can delete the topic.";

#[derive(Clone)]
pub struct DiscussionService {
    forum: Arc<dyn ForumClient>,
    categories: Arc<dyn CategoryStore>,
    assets: Arc<dyn AssetDirectory>,
    users: Arc<dyn UserDirectory>,
    events: Arc<dyn EventPublisher>,
}

impl DiscussionService {
    pub fn new(
        forum: Arc<dyn ForumClient>,
        categories: Arc<dyn CategoryStore>,
        assets: Arc<dyn AssetDirectory>,
        users: Arc<dyn UserDirectory>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            forum,
            categories,
            assets,
            users,
            events,
        }
    }

    pub fn forum(&self) -> &Arc<dyn ForumClient> {
        &self.forum
    }

    pub fn categories(&self) -> &Arc<dyn CategoryStore> {
        &self.categories
    }

    /// Category and topics of the asset's discussion, creating the category on first access.
    pub async fn get_discussion(&self, asset_id: Uuid) -> Result<DiscussionResponse> {
        let category = self.category_for_asset(asset_id).await?;
        let topics = self.forum.list_topics(&category.slug, category.id).await?;
        Ok(DiscussionResponse::from_category(&category, &topics))
    }

    pub async fn list_topics(&self, slug: &str, category_id: i64) -> Result<TopicsResponse> {
        let topics = self.forum.list_topics(slug, category_id).await?;
        Ok(TopicsResponse {
            topics: topics
                .iter()
                .map(|t| DiscussionTopicResponse::from_topic(t, &[]))
                .collect(),
        })
    }

    pub async fn get_topic(&self, topic_id: i64) -> Result<DiscussionTopicResponse> {
        info!(topic_id, "Getting topic posts");
        let (topic, posts) = self.forum.get_topic_with_posts(topic_id).await?;
        Ok(DiscussionTopicResponse::from_topic(&topic, &posts))
    }

    pub async fn create_topic(
        &self,
        user: &PlatformUser,
        body: CreateTopicBody,
        transaction_id: &str,
    ) -> Result<DiscussionPostResponse> {
        if let Err(errors) = body.validate() {
            error!(title = %body.title, "Topic rejected by validation");
            return Err(AppError::first_invalid_field(errors, &["title", "text"]));
        }

        self.forum.ensure_user(user).await?;

        let category_id = self
            .categories
            .category_for_asset(body.asset_id)
            .await?
            .ok_or(AppError::MissingCategory(body.asset_id))?;
        debug!(category_id, asset_id = %body.asset_id, "Found category for asset");

        let post = self
            .forum
            .create_topic(&user.username, category_id, &body.title, &body.text)
            .await?;

        self.events
            .publish_moderation(&ModerationRequest::for_topic(
                post.topic_id,
                &body.title,
                &user.id,
                transaction_id,
            ))
            .await?;
        self.events
            .publish_moderation(&ModerationRequest::for_post(
                post.id,
                &body.text,
                &user.id,
                transaction_id,
            ))
            .await?;
        info!(topic_id = post.topic_id, asset_id = %body.asset_id, "Topic created");

        let notification = if body.asset_id == STANDALONE_POST_ASSET_ID {
            EmailNotification::new(
                EmailTemplate::Generic,
                &user.id,
                &user.email,
                "New Post Created",
                format!("A new post '{}' has been created.", body.title),
            )
        } else {
            let asset = self.assets.asset_summary(body.asset_id).await?;
            let owner_email = self.users.email_for_user(&asset.owner_id).await?;
            EmailNotification::new(
                EmailTemplate::Generic,
                &user.id,
                owner_email,
                "New Topic created for your asset",
                format!(
                    "A new topic '{}' has been created for your asset '{}'",
                    body.title, asset.name
                ),
            )
        };
        self.events.publish_notification(&notification).await?;

        Ok(DiscussionPostResponse::from(&post))
    }

    pub async fn create_post(
        &self,
        user: &PlatformUser,
        topic_id: i64,
        body: CreatePostBody,
        transaction_id: &str,
    ) -> Result<DiscussionPostResponse> {
        self.forum.ensure_user(user).await?;

        let post = self
            .forum
            .create_post(&user.username, topic_id, &body.text)
            .await?;

        self.events
            .publish_moderation(&ModerationRequest::for_post(
                post.id,
                &body.text,
                &user.id,
                transaction_id,
            ))
            .await?;

        Ok(DiscussionPostResponse::from(&post))
    }

    pub async fn edit_post(&self, post_id: i64, body: EditPostBody) -> Result<DiscussionPostResponse> {
        let post = self.forum.edit_post(post_id, &body.text).await?;
        Ok(DiscussionPostResponse::from(&post))
    }

    /// Moderation reject callback for a post: overwrite the text and tell the caller.
    pub async fn moderate_post(
        &self,
        user: &PlatformUser,
        post_id: i64,
        body: EditPostBody,
    ) -> Result<DiscussionPostResponse> {
        self.forum.ensure_user(user).await?;

        let original = self.forum.get_post(post_id).await?;
        let post = self.forum.edit_post(post_id, &body.text).await?;

        self.events
            .publish_notification(&EmailNotification::new(
                EmailTemplate::AssetModerationRejected,
                &user.id,
                &user.email,
                "Post refused by moderation",
                format!("Post has been refused by the moderation: {}", original.cooked),
            ))
            .await?;
        info!(post_id, "Post moderated");

        Ok(DiscussionPostResponse::from(&post))
    }

    pub async fn delete_topic(&self, user: &PlatformUser, topic_id: i64) -> Result<MessageResponse> {
        info!(topic_id, "Deleting topic");
        self.forum.ensure_user(user).await?;

        let topic = self.forum.get_topic(topic_id).await?;
        let is_owner = topic.username.as_deref() == Some(user.username.as_str());
        debug!(topic_id, is_owner, is_admin = user.is_admin(), "Checking delete permission");
        if !is_owner && !user.is_admin() {
            error!(topic_id, username = %user.username, "{}", DELETE_FORBIDDEN_MESSAGE);
            return Err(AppError::Forbidden(DELETE_FORBIDDEN_MESSAGE.to_string()));
        }

        self.forum.delete_topic(topic_id).await?;
        Ok(MessageResponse::new(TOPIC_DELETED_MESSAGE))
    }

    /// Moderation reject callback for a topic: delete it and tell the caller.
    pub async fn moderate_topic(&self, user: &PlatformUser, topic_id: i64) -> Result<MessageResponse> {
        info!(topic_id, "Moderating topic");
        self.forum.ensure_user(user).await?;

        let topic = self.forum.get_topic(topic_id).await?;
        self.forum.delete_topic(topic_id).await?;

        self.events
            .publish_notification(&EmailNotification::new(
                EmailTemplate::AssetModerationRejected,
                &user.id,
                &user.email,
                "Topic refused by moderation",
                format!("Topic has been refused by the moderation: {}", topic.title),
            ))
            .await?;

        info!(topic_id, "Topic moderated");
        Ok(MessageResponse::new(TOPIC_MODERATED_MESSAGE))
    }

    async fn category_for_asset(&self, asset_id: Uuid) -> Result<DiscourseCategory> {
        info!(asset_id = %asset_id, "Resolving discussion category");

        let stale = self.categories.category_for_asset(asset_id).await?;
        if let Some(category_id) = stale {
            if let Some(category) = self.forum.get_category(category_id).await? {
                return Ok(category);
            }
        }

        let name = format!("{}_{}", rand::thread_rng().gen_range(0..1_000_000), asset_id);
        let category = self.forum.create_category(&name).await?;
        CATEGORIES_CREATED_TOTAL.inc();

        let bound = match stale {
            Some(_) => {
                self.categories.save_category(asset_id, category.id).await?;
                category.id
            }
            None => self.categories.bind_category(asset_id, category.id).await?,
        };

        if bound != category.id {
            warn!(
                asset_id = %asset_id,
                category_id = bound,
                orphaned_category_id = category.id,
                "Category mapping taken by a concurrent request"
            );
            if let Some(winner) = self.forum.get_category(bound).await? {
                return Ok(winner);
            }
            return Err(AppError::ResourceUnavailable);
        }

        info!(asset_id = %asset_id, category_id = category.id, "Discussion category created");
        Ok(category)
    }
}
