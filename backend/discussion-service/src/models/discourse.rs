//! Discourse REST payloads.
//!
//! Only the fields the service reads are declared; serde ignores everything else Discourse
//! sends back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscourseCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub topic_count: i64,
    #[serde(default)]
    pub post_count: i64,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub read_restricted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscourseTopic {
    pub id: i64,
    pub title: String,
    pub fancy_title: String,
    pub slug: String,
    pub posts_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub highest_post_number: i64,
    pub created_at: String,
    #[serde(default)]
    pub last_posted_at: Option<String>,
    pub category_id: i64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub like_count: i64,
    /// Creator username; filled by the client from `posters` or `details.created_by`.
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoursePost {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub username: String,
    #[serde(default)]
    pub avatar_template: String,
    pub created_at: String,
    #[serde(default)]
    pub cooked: String,
    #[serde(default)]
    pub post_number: i64,
    pub topic_id: i64,
    #[serde(default)]
    pub display_username: Option<String>,
    pub user_id: i64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `GET /c/{slug}/{id}.json`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryTopicsPage {
    #[serde(default)]
    pub users: Vec<TopicListUser>,
    pub topic_list: TopicList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicListUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub topics: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicPoster {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

fn default_true() -> bool {
    true
}
