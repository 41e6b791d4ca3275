use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::application::repo::seaorm::SeaOrmApplicationRepository;
use service::application::ApplicationService;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::errors::AuthError;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
    pub applications: Arc<ApplicationService<SeaOrmApplicationRepository>>,
}

impl ServerState {
    fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository { db: self.db.clone() });
        AuthService::new(repo, AuthConfig {
            jwt_secret: Some(self.auth.jwt_secret.clone()),
            password_algorithm: "argon2".into(),
            token_ttl_hours: self.auth.token_ttl_hours,
        })
    }
}

#[derive(Serialize)]
pub struct UserOutput {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<AuthUser> for UserOutput {
    fn from(user: AuthUser) -> Self {
        Self { id: user.id, email: user.email, name: user.name }
    }
}

#[derive(Serialize)]
pub struct AuthOutput {
    pub token: String,
    pub user: UserOutput,
}

fn map_auth_error(e: AuthError) -> ApiError {
    tracing::debug!(code = e.code(), err = %e, "auth request failed");
    match &e {
        AuthError::Validation(_) => ApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.to_string())),
        AuthError::Conflict => ApiError::new(StatusCode::CONFLICT, "User already exists", None),
        AuthError::Unauthorized | AuthError::NotFound => {
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials", None)
        }
        _ => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Auth Error", Some(e.to_string())),
    }
}

fn session_output(session: service::auth::domain::AuthSession) -> Result<AuthOutput, ApiError> {
    let token = session
        .token
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed", None))?;
    Ok(AuthOutput { token, user: session.user.into() })
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<(StatusCode, Json<AuthOutput>), ApiError> {
    let session = state.auth_service().register(input).await.map_err(map_auth_error)?;
    Ok((StatusCode::CREATED, Json(session_output(session)?)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, Json(input): Json<LoginInput>) -> Result<Json<AuthOutput>, ApiError> {
    let session = state.auth_service().login(input).await.map_err(map_auth_error)?;
    Ok(Json(session_output(session)?))
}

/// Verified caller identity, injected into request extensions by
/// [`require_bearer_token`].
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
struct Claims {
    uid: String,
}

/// Route-layer middleware: validate `Authorization: Bearer <token>` and
/// expose the caller id. Missing or invalid tokens are 401.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();

    let token = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    let Some(token) = token else {
        tracing::warn!(path = %path, "missing Authorization bearer token");
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Authorization token missing", None));
    };

    let key = DecodingKey::from_secret(state.auth.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    match decode::<Claims>(&token, &key, &validation) {
        Ok(data) => {
            let uid = Uuid::parse_str(&data.claims.uid).map_err(|_| {
                tracing::warn!(path = %path, "token uid claim is not a uuid");
                ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or expired token", None)
            })?;
            req.extensions_mut().insert(CurrentUser { id: uid });
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or expired token", None))
        }
    }
}
