use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub name: String, pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub company_name: String,
    pub role: String,
    pub status: Option<String>,
    pub rounds: Option<Vec<RoundRequest>>,
    pub notes: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct RoundRequest {
    pub name: String,
    pub status: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(utoipa::ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdateApplicationRequest {
    pub company_name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub rounds: Option<Vec<RoundRequest>>,
}

#[derive(utoipa::ToSchema)]
pub struct StatusUpdateRequest { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct AddRoundRequest { pub name: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::applications::list,
        crate::routes::applications::create,
        crate::routes::applications::get_by_id,
        crate::routes::applications::update,
        crate::routes::applications::delete,
        crate::routes::applications::set_status,
        crate::routes::applications::add_round,
        crate::routes::applications::set_round_status,
        crate::routes::applications::delete_round,
        crate::routes::applications::add_attachment,
        crate::routes::applications::delete_attachment,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            CreateApplicationRequest,
            RoundRequest,
            UpdateApplicationRequest,
            StatusUpdateRequest,
            AddRoundRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "applications"),
        (name = "rounds"),
        (name = "attachments"),
    )
)]
pub struct ApiDoc;
