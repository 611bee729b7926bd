/// HTTP middleware and extractors for discussion-service
///
/// Reading a discussion is public; writing requires a platform access token. The middleware
/// therefore lets anonymous requests through and only rejects a *present but invalid* bearer
/// token. Handlers that need a caller ask for `CurrentUser`.
use crate::error::AppError;
use crate::models::PlatformUser;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

pub const TRANSACTION_ID_HEADER: &str = "X-Transaction-Id";
const REQUEST_ID_HEADER: &str = "X-Request-Id";

// =====================================================================
// JWT validation
// =====================================================================

/// Access token claims issued by the platform auth service
#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<Claims> for PlatformUser {
    fn from(claims: Claims) -> Self {
        PlatformUser {
            display_name: claims
                .display_name
                .unwrap_or_else(|| claims.username.clone()),
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            roles: claims.roles,
        }
    }
}

/// RS256 verifier. Without a configured key every token is refused.
pub struct JwtValidator {
    key: Option<DecodingKey>,
}

impl JwtValidator {
    pub fn from_public_key_pem(pem: Option<&str>) -> Result<Self, AppError> {
        let key = pem
            .map(|pem| {
                DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::Internal(format!("Failed to parse RSA public key: {}", e))
                })
            })
            .transpose()?;

        if key.is_none() {
            tracing::warn!("JWT_PUBLIC_KEY_PEM not set, authenticated routes will answer 401");
        }

        Ok(Self { key })
    }

    pub fn validate(&self, token: &str) -> Result<PlatformUser, AppError> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Token validation is not configured".into()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(data.claims.into())
    }
}

// =====================================================================
// Authentication middleware
// =====================================================================

/// Resolves `Authorization: Bearer` into a `PlatformUser` request extension.
pub struct JwtAuthMiddleware {
    validator: Arc<JwtValidator>,
}

impl JwtAuthMiddleware {
    pub fn new(validator: Arc<JwtValidator>) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    validator: Arc<JwtValidator>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let validator = self.validator.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            if let Some(header) = auth_header {
                let user = match header.strip_prefix("Bearer ") {
                    Some(token) => validator.validate(token),
                    None => Err(AppError::Unauthorized("Invalid Authorization scheme".into())),
                };
                match user {
                    Ok(user) => {
                        tracing::debug!(user_id = %user.id, "Request authenticated");
                        req.extensions_mut().insert(user);
                    }
                    Err(err) => return Ok(req.error_response(err).map_into_right_body()),
                }
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

// =====================================================================
// Extractors
// =====================================================================

/// Authenticated caller; 401 when the request is anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PlatformUser);

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<PlatformUser>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(|| AppError::AuthenticationNeeded.into()),
        )
    }
}

/// Correlation id forwarded into moderation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionId(pub String);

impl FromRequest for TransactionId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let id = header(TRANSACTION_ID_HEADER)
            .or_else(|| header(REQUEST_ID_HEADER))
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        ready(Ok(TransactionId(id)))
    }
}

// =====================================================================
// Role checks
// =====================================================================

/// Admins pass every role check.
pub fn require_role(user: &PlatformUser, role: &str) -> Result<(), AppError> {
    if user.is_admin() || user.has_role(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You need the '{}' role to perform this action",
            role
        )))
    }
}
