use discussion_service::clients::{AssetClient, AssetDirectory, AuthServiceClient, UserDirectory};
use discussion_service::AppError;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_asset_summary() {
    let server = MockServer::start().await;
    let asset_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/{}", asset_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "public": {
                    "id": asset_id,
                    "name": "Sentinel-2 mosaic",
                    "despUserId": "owner-1",
                    "type": "dataset"
                },
                "private": {}
            },
            "error": null
        })))
        .mount(&server)
        .await;

    let assets = AssetClient::new(&server.uri(), 2_000).unwrap();
    let summary = assets.asset_summary(asset_id).await.unwrap();
    assert_eq!(summary.owner_id, "owner-1");
    assert_eq!(summary.name, "Sentinel-2 mosaic");
}

#[tokio::test]
async fn test_asset_lookup_failure_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let assets = AssetClient::new(&server.uri(), 2_000).unwrap();
    let err = assets.asset_summary(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::UpstreamService {
            service: "asset-management",
            ..
        }
    ));
}

#[tokio::test]
async fn test_asset_payload_without_owner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"public": {"name": "orphan"}}
        })))
        .mount(&server)
        .await;

    let assets = AssetClient::new(&server.uri(), 2_000).unwrap();
    assert!(assets.asset_summary(Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn test_email_for_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile/owner-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "profile": {
                    "id": "owner-1",
                    "email": "owner@example.org",
                    "firstname": "Owner"
                }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/profile/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let users = AuthServiceClient::new(&server.uri(), 2_000).unwrap();
    assert_eq!(
        users.email_for_user("owner-1").await.unwrap(),
        "owner@example.org"
    );
    assert!(matches!(
        users.email_for_user("ghost").await,
        Err(AppError::UpstreamService { service: "auth", .. })
    ));
}
