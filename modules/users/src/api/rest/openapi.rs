use utoipa::openapi::server::Server;
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Management API",
        version = "1.0.0",
        description = "CRUD operations for user accounts with caching, metrics and asynchronous lookups",
        contact(
            name = "Development Team",
            email = "dev@userapp.local",
            url = "https://github.com/yourorg/user-management"
        ),
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::list_active_users,
        handlers::create_user,
        handlers::search_users,
        handlers::get_user_by_username,
        handlers::get_user,
        handlers::update_user,
        handlers::deactivate_user,
        handlers::cache_stats,
        handlers::metrics,
    ),
    components(schemas(
        dto::UserDto,
        dto::CreateUserReq,
        dto::UpdateUserReq,
        dto::CacheStatsDto,
        modkit::Problem,
        modkit::ValidationError,
    )),
    tags(
        (name = "users", description = "User account management"),
        (name = "cache", description = "User cache diagnostics"),
        (name = "metrics", description = "Prometheus exposition")
    )
)]
pub struct UsersApiDoc;

const SERVERS: [(&str, &str); 3] = [
    ("http://localhost:8080", "Development server"),
    ("http://userapp.local", "Local Kubernetes"),
    ("https://api.userapp.yourdomain.com", "Production server"),
];

/// Build the document with server URLs carrying the configured context path.
pub fn openapi(context_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = UsersApiDoc::openapi();
    let suffix = context_path.trim_end_matches('/');
    doc.servers = Some(
        SERVERS
            .iter()
            .map(|(base, description)| {
                let mut server = Server::new(format!("{base}{suffix}"));
                server.description = Some((*description).to_string());
                server
            })
            .collect(),
    );
    doc
}
