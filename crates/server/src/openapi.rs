use utoipa::{IntoParams, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginResponse {
    pub username: String,
    /// Base64 session token for the `API-Token` header
    pub token: String,
    pub expires_at: Option<String>,
}

#[derive(ToSchema)]
pub struct CreateDomainRequest { pub name: String }

#[derive(ToSchema)]
pub struct DomainDetailDoc { pub name: String, pub created_at: Option<String>, pub user_count: usize }

#[derive(ToSchema)]
pub struct CreateUserRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct UserDoc { pub username: String, pub aliases: Vec<String> }

#[derive(ToSchema)]
pub struct AliasRequest { pub alias: String }

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Entries to skip, default 0
    pub offset: Option<usize>,
    /// Page size, 1..=1000; all remaining entries when absent
    pub limit: Option<usize>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::domains::list,
        crate::routes::domains::create,
        crate::routes::domains::get,
        crate::routes::domains::delete,
        crate::routes::users::list,
        crate::routes::users::create,
        crate::routes::users::delete,
        crate::routes::users::add_alias,
        crate::routes::users::remove_alias,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginResponse,
            CreateDomainRequest,
            DomainDetailDoc,
            CreateUserRequest,
            UserDoc,
            AliasRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "domain"),
        (name = "user")
    )
)]
pub struct ApiDoc;
