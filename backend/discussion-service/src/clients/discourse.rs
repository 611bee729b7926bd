/// Discourse REST API client
///
/// Every discussion lives in a Discourse instance. Calls are authenticated with the admin API key
/// and, for content created by a platform user, impersonate that user through `Api-Username`.
///
/// ## API documentation
/// https://docs.discourse.org/
use crate::config::DiscourseConfig;
use crate::error::{AppError, Result};
use crate::metrics::{FORUM_REQUESTS_TOTAL, FORUM_REQUEST_DURATION_SECONDS};
use crate::models::discourse::{CategoryTopicsPage, TopicPoster};
use crate::models::{DiscourseCategory, DiscoursePost, DiscourseTopic, PlatformUser};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Title of the "About the …" topic Discourse creates inside every category we create.
static DEFAULT_TOPIC_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^About the \d+_[a-f0-9\-]+ category").expect("default topic pattern is valid")
});

const ORIGINAL_POSTER: &str = "Original Poster";

/// Operations the discussion service needs from the forum engine
#[async_trait]
pub trait ForumClient: Send + Sync {
    /// Make sure the platform user has a forum account so it can be impersonated.
    async fn ensure_user(&self, user: &PlatformUser) -> Result<()>;

    /// `None` when Discourse does not know the category.
    async fn get_category(&self, category_id: i64) -> Result<Option<DiscourseCategory>>;

    async fn create_category(&self, name: &str) -> Result<DiscourseCategory>;

    /// Public topic listing of a category, without auto-generated "About" topics.
    async fn list_topics(&self, slug: &str, category_id: i64) -> Result<Vec<DiscourseTopic>>;

    /// Create a topic as `username`; returns its first post.
    async fn create_topic(
        &self,
        username: &str,
        category_id: i64,
        title: &str,
        raw: &str,
    ) -> Result<DiscoursePost>;

    async fn create_post(&self, username: &str, topic_id: i64, raw: &str) -> Result<DiscoursePost>;

    async fn get_topic(&self, topic_id: i64) -> Result<DiscourseTopic>;

    async fn get_topic_with_posts(
        &self,
        topic_id: i64,
    ) -> Result<(DiscourseTopic, Vec<DiscoursePost>)>;

    async fn get_post(&self, post_id: i64) -> Result<DiscoursePost>;

    async fn edit_post(&self, post_id: i64, raw: &str) -> Result<DiscoursePost>;

    async fn delete_topic(&self, topic_id: i64) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct DiscourseClient {
    client: Client,
    base_url: String,
    api_key: String,
    system_username: String,
    user_email_domain: String,
}

impl DiscourseClient {
    pub fn new(config: &DiscourseConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .danger_accept_invalid_certs(!config.ssl_check)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build Discourse client: {}", e)))?;

        info!(
            host = %config.host,
            ssl_check = config.ssl_check,
            "Discourse client initialized"
        );

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            system_username: config.system_username.clone(),
            user_email_domain: config.user_email_domain.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticated request, impersonating `username` or the system user.
    fn request(&self, method: Method, path: &str, username: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("Api-Key", &self.api_key)
            .header("Api-Username", username.unwrap_or(self.system_username.as_str()))
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<Response> {
        let timer = FORUM_REQUEST_DURATION_SECONDS
            .with_label_values(&[operation])
            .start_timer();
        let result = builder.send().await;
        timer.observe_duration();

        result.map_err(|e| {
            error!(operation, error = %e, "Discourse request failed");
            FORUM_REQUESTS_TOTAL
                .with_label_values(&[operation, "error"])
                .inc();
            AppError::ForumUnavailable(format!("{} failed: {}", operation, e))
        })
    }

    /// Pass successful responses through, turn anything else into the matching `AppError`.
    async fn ensure_success(&self, operation: &'static str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            FORUM_REQUESTS_TOTAL
                .with_label_values(&[operation, "ok"])
                .inc();
            return Ok(response);
        }

        FORUM_REQUESTS_TOTAL
            .with_label_values(&[operation, "error"])
            .inc();
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(&self.base_url, operation, status, &body))
    }

    async fn read_json<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            error!(operation, error = %e, "Unexpected Discourse payload");
            AppError::ForumUnavailable(format!("invalid payload during {}: {}", operation, e))
        })
    }

    async fn fetch_topic_value(&self, topic_id: i64, print: bool) -> Result<Value> {
        let operation = if print { "post_listing" } else { "topic_fetch" };
        let path = format!("/t/{}.json", topic_id);
        let mut builder = self.request(Method::GET, &path, None);
        if print {
            builder = builder.query(&[("print", "true")]);
        }

        let response = self.send(operation, builder).await?;
        let response = self.ensure_success(operation, response).await?;
        Self::read_json(operation, response).await
    }
}

#[async_trait]
impl ForumClient for DiscourseClient {
    async fn ensure_user(&self, user: &PlatformUser) -> Result<()> {
        info!(user_id = %user.id, username = %user.username, "Checking forum user");

        let password: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let payload = json!({
            "name": user.display_name,
            "email": format!("{}@{}", user.id, self.user_email_domain),
            "password": password,
            "username": user.username,
            "active": true,
            "approved": true,
        });

        let builder = self.request(Method::POST, "/users.json", None).json(&payload);
        let response = self.send("user_ensure", builder).await?;
        debug!(status = %response.status(), "Discourse user call returned");
        // Either the account was just created or it already existed; both are fine since we
        // always impersonate.
        self.ensure_success("user_ensure", response).await?;
        Ok(())
    }

    async fn get_category(&self, category_id: i64) -> Result<Option<DiscourseCategory>> {
        let path = format!("/c/{}/show.json", category_id);
        let builder = self.request(Method::GET, &path, None);
        let response = self.send("category_fetch", builder).await?;

        if response.status() == StatusCode::NOT_FOUND {
            FORUM_REQUESTS_TOTAL
                .with_label_values(&["category_fetch", "not_found"])
                .inc();
            warn!(category_id, "Discourse category not found");
            return Ok(None);
        }

        let response = self.ensure_success("category_fetch", response).await?;
        let body: Value = Self::read_json("category_fetch", response).await?;
        category_from_body(body).map(Some)
    }

    async fn create_category(&self, name: &str) -> Result<DiscourseCategory> {
        info!(name, "Creating Discourse category");

        let builder = self
            .request(Method::POST, "/categories.json", None)
            .json(&json!({ "name": name }));
        let response = self.send("category_create", builder).await?;
        let response = self.ensure_success("category_create", response).await?;
        let body: Value = Self::read_json("category_create", response).await?;

        if let Some(errors) = payload_errors(&body) {
            return Err(AppError::ForumRequest(errors));
        }
        category_from_body(body)
    }

    async fn list_topics(&self, slug: &str, category_id: i64) -> Result<Vec<DiscourseTopic>> {
        info!(slug, category_id, "Getting topics");

        // Public view: no credentials so read-restricted content stays hidden.
        let path = format!("/c/{}/{}.json", urlencoding::encode(slug), category_id);
        let builder = self
            .client
            .get(self.url(&path))
            .header(ACCEPT, "application/json");
        let response = self.send("topic_listing", builder).await?;

        if response.status() == StatusCode::NOT_FOUND {
            FORUM_REQUESTS_TOTAL
                .with_label_values(&["topic_listing", "not_found"])
                .inc();
            error!(category_id, slug, "Category does not exist");
            return Err(AppError::ResourceUnavailable);
        }

        let response = self.ensure_success("topic_listing", response).await?;
        let page: CategoryTopicsPage = Self::read_json("topic_listing", response).await?;
        let topics = enrich_topics(page)?;
        debug!(count = topics.len(), "Category topics loaded");
        Ok(topics)
    }

    async fn create_topic(
        &self,
        username: &str,
        category_id: i64,
        title: &str,
        raw: &str,
    ) -> Result<DiscoursePost> {
        info!(category_id, username, "Creating discourse topic");

        let payload = json!({
            "category": category_id,
            "title": title,
            "raw": raw,
        });
        let builder = self
            .request(Method::POST, "/posts.json", Some(username))
            .json(&payload);
        let response = self.send("topic_create", builder).await?;
        let response = self.ensure_success("topic_create", response).await?;
        let body: Value = Self::read_json("topic_create", response).await?;

        if let Some(errors) = payload_errors(&body) {
            return Err(AppError::ForumRequest(errors));
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn create_post(&self, username: &str, topic_id: i64, raw: &str) -> Result<DiscoursePost> {
        info!(topic_id, username, "Creating discourse post");

        let builder = self
            .request(Method::POST, "/posts.json", Some(username))
            .json(&json!({ "topic_id": topic_id, "raw": raw }));
        let response = self.send("post_create", builder).await?;
        let response = self.ensure_success("post_create", response).await?;
        let body: Value = Self::read_json("post_create", response).await?;

        if let Some(errors) = payload_errors(&body) {
            return Err(AppError::ForumRequest(errors));
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn get_topic(&self, topic_id: i64) -> Result<DiscourseTopic> {
        let body = self.fetch_topic_value(topic_id, false).await?;
        topic_from_value(body)
    }

    async fn get_topic_with_posts(
        &self,
        topic_id: i64,
    ) -> Result<(DiscourseTopic, Vec<DiscoursePost>)> {
        let body = self.fetch_topic_value(topic_id, true).await?;
        let posts: Vec<DiscoursePost> = match body.pointer("/post_stream/posts") {
            Some(posts) => serde_json::from_value(posts.clone())?,
            None => Vec::new(),
        };
        let topic = topic_from_value(body)?;
        Ok((topic, posts))
    }

    async fn get_post(&self, post_id: i64) -> Result<DiscoursePost> {
        let path = format!("/posts/{}.json", post_id);
        let builder = self.request(Method::GET, &path, None);
        let response = self.send("post_fetch", builder).await?;
        let response = self.ensure_success("post_fetch", response).await?;
        Self::read_json("post_fetch", response).await
    }

    async fn edit_post(&self, post_id: i64, raw: &str) -> Result<DiscoursePost> {
        let path = format!("/posts/{}.json", post_id);
        let builder = self
            .request(Method::PUT, &path, None)
            .json(&json!({ "raw": raw }));
        let response = self.send("post_edit", builder).await?;
        let response = self.ensure_success("post_edit", response).await?;
        let body: Value = Self::read_json("post_edit", response).await?;

        let post = body.get("post").cloned().ok_or_else(|| {
            AppError::ForumUnavailable("post edition answered without a post".to_string())
        })?;
        Ok(serde_json::from_value(post)?)
    }

    async fn delete_topic(&self, topic_id: i64) -> Result<()> {
        info!(topic_id, "Deleting discourse topic");

        let path = format!("/t/{}.json", topic_id);
        let builder = self.request(Method::DELETE, &path, None);
        let response = self.send("topic_delete", builder).await?;
        self.ensure_success("topic_delete", response).await?;

        info!(topic_id, "Topic successfully deleted");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let builder = self.request(Method::GET, "/site/basic-info.json", None);
        let response = self.send("health_check", builder).await?;
        self.ensure_success("health_check", response).await?;
        Ok(())
    }
}

/// Map a non-2xx Discourse status to the error the API layer reports.
pub(crate) fn classify_failure(
    host: &str,
    operation: &str,
    status: StatusCode,
    body: &str,
) -> AppError {
    if status.is_server_error() {
        error!(
            host,
            operation,
            status = status.as_u16(),
            body,
            "Something is wrong with the Discourse app"
        );
        return AppError::ForumUnavailable(format!(
            "Discourse answered {} during {}",
            status.as_u16(),
            operation
        ));
    }

    let errors = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| payload_errors(&v));

    match status {
        StatusCode::FORBIDDEN => {
            error!(host, operation, "Authentication issue on Discourse");
            AppError::ForumAuthentication(format!(
                "Failed to authenticate on discourse during {}",
                operation
            ))
        }
        StatusCode::UNPROCESSABLE_ENTITY => {
            error!(operation, ?errors, "Provided parameters are not matching expectation");
            AppError::ForumRequest(errors.unwrap_or_else(|| {
                format!("Provided parameters are not matching expectation during {}", operation)
            }))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            error!(operation, "Too many requests to Discourse");
            AppError::ForumRequest(
                errors.unwrap_or_else(|| format!("Too many request during {}", operation)),
            )
        }
        _ => {
            warn!(operation, status = status.as_u16(), body, "Unexpected Discourse status");
            AppError::ForumRequest(errors.unwrap_or_else(|| {
                format!("Discourse answered {} during {}", status.as_u16(), operation)
            }))
        }
    }
}

/// Discourse reports failures as `{"errors": [..]}` or `{"error": ..}`; join them with `-`.
pub(crate) fn payload_errors(body: &Value) -> Option<String> {
    let collect = |value: &Value| -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("-"))
                }
            }
            _ => None,
        }
    };

    body.get("errors")
        .and_then(collect)
        .or_else(|| body.get("error").and_then(collect))
}

/// Whether a topic title is the auto-generated "About the <n>_<asset> category" topic.
pub fn is_default_topic(title: &str) -> bool {
    DEFAULT_TOPIC_TITLE.is_match(title)
}

/// Drop default topics and attach the original poster's username to each remaining topic.
pub(crate) fn enrich_topics(page: CategoryTopicsPage) -> Result<Vec<DiscourseTopic>> {
    let user_lookup: HashMap<i64, String> = page
        .users
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let mut topics = Vec::with_capacity(page.topic_list.topics.len());
    for mut raw in page.topic_list.topics {
        let title = raw.get("title").and_then(Value::as_str).unwrap_or_default();
        if is_default_topic(title) {
            continue;
        }

        let posters: Vec<TopicPoster> = raw
            .get("posters")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        let username = posters
            .iter()
            .find(|p| p.description.contains(ORIGINAL_POSTER))
            .and_then(|p| p.user_id)
            .and_then(|id| user_lookup.get(&id).cloned());

        if let Some(obj) = raw.as_object_mut() {
            obj.insert(
                "username".to_string(),
                username.map(Value::String).unwrap_or(Value::Null),
            );
        }
        topics.push(serde_json::from_value(raw)?);
    }

    Ok(topics)
}

/// Topic from `GET /t/{id}.json`, creator taken from `details.created_by`.
pub(crate) fn topic_from_value(mut body: Value) -> Result<DiscourseTopic> {
    if let Some(username) = body.pointer("/details/created_by/username").cloned() {
        if let Some(obj) = body.as_object_mut() {
            obj.insert("username".to_string(), username);
        }
    }
    Ok(serde_json::from_value(body)?)
}

fn category_from_body(mut body: Value) -> Result<DiscourseCategory> {
    let category = body
        .get_mut("category")
        .map(Value::take)
        .ok_or_else(|| AppError::ForumUnavailable("category payload missing".to_string()))?;
    Ok(serde_json::from_value(category)?)
}
