use crate::error::Result;
use crate::models::{ApiResponse, DiscussionResponse, TopicsResponse};
use crate::services::DiscussionService;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// Discussion of an asset, created on first access
#[utoipa::path(
    get,
    path = "/discussion/{asset_id}",
    tag = "discussion",
    params(("asset_id" = Uuid, Path, description = "Platform asset id")),
    responses(
        (status = 200, description = "Category and its topics", body = DiscussionResponse),
        (status = 400, description = "Malformed asset id"),
        (status = 502, description = "Forum unavailable")
    )
)]
pub async fn get_discussion(
    service: web::Data<DiscussionService>,
    asset_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let discussion = service.get_discussion(asset_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(discussion)))
}

/// Topics of a category
#[utoipa::path(
    get,
    path = "/topics/{slug}/{category}",
    tag = "discussion",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ("category" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category topics", body = TopicsResponse),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn list_topics(
    service: web::Data<DiscussionService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (slug, category_id) = path.into_inner();
    let topics = service.list_topics(&slug, category_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(topics)))
}
