/// OpenAPI documentation for the Discussion Service
use crate::handlers;
use crate::models::{
    CreatePostBody, CreateTopicBody, DiscussionPostResponse, DiscussionResponse,
    DiscussionTopicResponse, EditPostBody, MessageResponse, TopicsResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Discussion Service API",
        version = "0.1.0",
        description = "Asset discussions backed by Discourse: one category per asset, topics and posts created on behalf of platform users, moderation callbacks.",
        license(name = "MIT")
    ),
    paths(
        handlers::discussion::get_discussion,
        handlers::discussion::list_topics,
        handlers::topics::get_topic,
        handlers::topics::create_topic,
        handlers::topics::create_post,
        handlers::topics::delete_topic,
        handlers::topics::moderate_topic,
        handlers::posts::edit_post,
        handlers::posts::moderate_post,
    ),
    components(schemas(
        CreateTopicBody,
        CreatePostBody,
        EditPostBody,
        DiscussionPostResponse,
        DiscussionTopicResponse,
        DiscussionResponse,
        TopicsResponse,
        MessageResponse,
    )),
    tags(
        (name = "discussion", description = "Asset discussions, topics and posts"),
        (name = "moderation", description = "Post edition and moderation callbacks"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Platform access token"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/v1/openapi.json"
    }
}
