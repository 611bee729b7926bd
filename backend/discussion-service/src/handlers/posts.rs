use crate::error::Result;
use crate::middleware::{require_role, CurrentUser};
use crate::models::{ApiResponse, DiscussionPostResponse, EditPostBody};
use crate::services::DiscussionService;
use actix_web::{web, HttpResponse};

/// Replace the text of a post
#[utoipa::path(
    put,
    path = "/post/{post_id}",
    tag = "moderation",
    params(("post_id" = i64, Path, description = "Post id")),
    request_body = EditPostBody,
    responses(
        (status = 200, description = "Updated post", body = DiscussionPostResponse),
        (status = 403, description = "Moderator role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn edit_post(
    service: web::Data<DiscussionService>,
    user: CurrentUser,
    post_id: web::Path<i64>,
    body: web::Json<EditPostBody>,
) -> Result<HttpResponse> {
    require_role(&user.0, "moderator")?;
    let post = service.edit_post(post_id.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// Moderation reject callback: blank the post and notify
#[utoipa::path(
    put,
    path = "/post/moderate/{post_id}",
    tag = "moderation",
    params(("post_id" = i64, Path, description = "Post id")),
    request_body = EditPostBody,
    responses((status = 200, description = "Moderated post", body = DiscussionPostResponse)),
    security(("bearer_auth" = []))
)]
pub async fn moderate_post(
    service: web::Data<DiscussionService>,
    user: CurrentUser,
    post_id: web::Path<i64>,
    body: web::Json<EditPostBody>,
) -> Result<HttpResponse> {
    let post = service
        .moderate_post(&user.0, post_id.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}
