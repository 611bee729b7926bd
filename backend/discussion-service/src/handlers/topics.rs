use crate::error::Result;
use crate::middleware::{require_role, CurrentUser, TransactionId};
use crate::models::{
    ApiResponse, CreatePostBody, CreateTopicBody, DiscussionPostResponse,
    DiscussionTopicResponse, MessageResponse,
};
use crate::services::DiscussionService;
use actix_web::{web, HttpResponse};

/// Topic with all of its posts
#[utoipa::path(
    get,
    path = "/topic/{topic_id}",
    tag = "discussion",
    params(("topic_id" = i64, Path, description = "Topic id")),
    responses((status = 200, description = "Topic and posts", body = DiscussionTopicResponse))
)]
pub async fn get_topic(
    service: web::Data<DiscussionService>,
    topic_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let topic = service.get_topic(topic_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(topic)))
}

/// Create a topic in the discussion of an asset
#[utoipa::path(
    post,
    path = "/topic",
    tag = "discussion",
    request_body = CreateTopicBody,
    responses(
        (status = 200, description = "First post of the new topic", body = DiscussionPostResponse),
        (status = 400, description = "Title or text too short"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Asset has no discussion yet")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_topic(
    service: web::Data<DiscussionService>,
    user: CurrentUser,
    transaction: TransactionId,
    body: web::Json<CreateTopicBody>,
) -> Result<HttpResponse> {
    tracing::info!(asset_id = %body.asset_id, user_id = %user.0.id, "Creating topic");
    let post = service
        .create_topic(&user.0, body.into_inner(), &transaction.0)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// Reply to a topic
#[utoipa::path(
    post,
    path = "/topic/{topic_id}",
    tag = "discussion",
    params(("topic_id" = i64, Path, description = "Topic id")),
    request_body = CreatePostBody,
    responses(
        (status = 200, description = "Created post", body = DiscussionPostResponse),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    service: web::Data<DiscussionService>,
    user: CurrentUser,
    transaction: TransactionId,
    topic_id: web::Path<i64>,
    body: web::Json<CreatePostBody>,
) -> Result<HttpResponse> {
    let post = service
        .create_post(&user.0, topic_id.into_inner(), body.into_inner(), &transaction.0)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// Delete a topic (owner or admin)
#[utoipa::path(
    delete,
    path = "/topic/{topic_id}",
    tag = "discussion",
    params(("topic_id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic deleted", body = MessageResponse),
        (status = 403, description = "Caller is neither owner nor admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_topic(
    service: web::Data<DiscussionService>,
    user: CurrentUser,
    topic_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let message = service.delete_topic(&user.0, topic_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(message)))
}

/// Moderation reject callback: delete the topic
#[utoipa::path(
    delete,
    path = "/topic/moderate/{topic_id}",
    tag = "moderation",
    params(("topic_id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic moderated", body = MessageResponse),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn moderate_topic(
    service: web::Data<DiscussionService>,
    user: CurrentUser,
    topic_id: web::Path<i64>,
) -> Result<HttpResponse> {
    require_role(&user.0, "admin")?;
    let message = service.moderate_topic(&user.0, topic_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(message)))
}
