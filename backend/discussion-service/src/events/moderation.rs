//! Moderation requests handed to the auto-moderation pipeline.
//!
//! Each new topic title and post body becomes one `ModerationRequest`. When the content is
//! rejected, the moderation service calls back into this service through `reject_callbacks`.

use crate::models::CONTENT_BLOCKED;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CALLBACK_SERVICE: &str = "discussion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    AutoPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionalArea {
    DiscussionPost,
    DiscussionTopic,
}

impl FunctionalArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionalArea::DiscussionPost => "DISCUSSION_POST",
            FunctionalArea::DiscussionTopic => "DISCUSSION_TOPIC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoModerationType {
    TextToxicity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationContent {
    pub data_by_type: HashMap<ContentType, Vec<ContentItem>>,
}

impl ModerationContent {
    fn text(name: &str, value: &str) -> Self {
        let mut data_by_type = HashMap::new();
        data_by_type.insert(
            ContentType::Text,
            vec![ContentItem {
                name: name.to_string(),
                value: value.to_string(),
            }],
        );
        Self { data_by_type }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoModerationRoute {
    pub moderation_type: AutoModerationType,
}

/// HTTP call the moderation service performs against an internal service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpCallback {
    pub service: String,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub payload: serde_json::Value,
}

impl HttpCallback {
    fn content_blocked(method: &str, url: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            service: CALLBACK_SERVICE.to_string(),
            method: method.to_string(),
            url,
            headers,
            payload: serde_json::json!({ "text": CONTENT_BLOCKED }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub id: String,
    pub status: ModerationStatus,
    pub content_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub url: String,
    pub functional_area: FunctionalArea,
    pub content: ModerationContent,
    pub auto_mod_routing: Vec<AutoModerationRoute>,
    pub reject_callbacks: Vec<HttpCallback>,
    pub accept_callbacks: Vec<HttpCallback>,
    pub history: Vec<serde_json::Value>,
    pub transaction_id: String,
}

impl ModerationRequest {
    /// Post body moderation; rejection blanks the post.
    pub fn for_post(post_id: i64, text: &str, user_id: &str, transaction_id: &str) -> Self {
        Self::build(
            FunctionalArea::DiscussionPost,
            post_id,
            ModerationContent::text("post_content", text),
            HttpCallback::content_blocked("PUT", format!("/post/moderate/{}", post_id)),
            user_id,
            transaction_id,
        )
    }

    /// Topic title moderation; rejection deletes the topic.
    pub fn for_topic(topic_id: i64, title: &str, user_id: &str, transaction_id: &str) -> Self {
        Self::build(
            FunctionalArea::DiscussionTopic,
            topic_id,
            ModerationContent::text("topic_title", title),
            HttpCallback::content_blocked("DELETE", format!("/topic/moderate/{}", topic_id)),
            user_id,
            transaction_id,
        )
    }

    fn build(
        area: FunctionalArea,
        content_id: i64,
        content: ModerationContent,
        reject: HttpCallback,
        user_id: &str,
        transaction_id: &str,
    ) -> Self {
        Self {
            id: format!("{}-{}", area.as_str(), content_id),
            status: ModerationStatus::AutoPending,
            content_id: content_id.to_string(),
            user_id: user_id.to_string(),
            date: Utc::now(),
            url: String::new(),
            functional_area: area,
            content,
            auto_mod_routing: vec![AutoModerationRoute {
                moderation_type: AutoModerationType::TextToxicity,
            }],
            reject_callbacks: vec![reject],
            accept_callbacks: Vec::new(),
            history: Vec::new(),
            transaction_id: transaction_id.to_string(),
        }
    }
}
