/// Request and response shapes exposed to the platform UI
use crate::models::discourse::{DiscourseCategory, DiscoursePost, DiscourseTopic};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const TITLE_TOO_SHORT: &str = "You need to provide a title at least 15 chars";
pub const CONTENT_TOO_SHORT: &str = "You need to provide a content at least 20 chars";

/// Replacement text written over a post rejected by moderation
pub const CONTENT_BLOCKED: &str = "[Content has been blocked]";

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTopicBody {
    #[validate(length(min = 15, message = "You need to provide a title at least 15 chars"))]
    pub title: String,
    #[validate(length(min = 20, message = "You need to provide a content at least 20 chars"))]
    pub text: String,
    pub asset_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePostBody {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EditPostBody {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscussionPostResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub display_username: String,
    pub user_id: i64,
    pub avatar_template: String,
    pub created_at: String,
    pub cooked: String,
    pub topic_id: i64,
}

impl From<&DiscoursePost> for DiscussionPostResponse {
    fn from(post: &DiscoursePost) -> Self {
        Self {
            id: post.id,
            name: post.name.clone().unwrap_or_default(),
            username: post.username.clone(),
            display_username: post
                .display_username
                .clone()
                .unwrap_or_else(|| post.username.clone()),
            user_id: post.user_id,
            avatar_template: post.avatar_template.clone(),
            created_at: post.created_at.clone(),
            cooked: post.cooked.clone(),
            topic_id: post.topic_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscussionTopicResponse {
    pub posts: Vec<DiscussionPostResponse>,
    pub id: i64,
    pub title: String,
    pub fancy_title: String,
    pub posts_count: i64,
    pub created_at: String,
    pub slug: String,
    pub category_id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

impl DiscussionTopicResponse {
    pub fn from_topic(topic: &DiscourseTopic, posts: &[DiscoursePost]) -> Self {
        Self {
            posts: posts.iter().map(DiscussionPostResponse::from).collect(),
            id: topic.id,
            title: topic.title.clone(),
            fancy_title: topic.fancy_title.clone(),
            posts_count: topic.posts_count,
            created_at: topic.created_at.clone(),
            slug: topic.slug.clone(),
            category_id: topic.category_id,
            username: topic.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DiscussionResponse {
    pub id: i64,
    pub name: String,
    pub topics: Vec<DiscussionTopicResponse>,
}

impl DiscussionResponse {
    pub fn from_category(category: &DiscourseCategory, topics: &[DiscourseTopic]) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            topics: topics
                .iter()
                .map(|t| DiscussionTopicResponse::from_topic(t, &[]))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TopicsResponse {
    pub topics: Vec<DiscussionTopicResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
