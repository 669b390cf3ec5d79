use axum::{
    http::Uri,
    response::{Html, IntoResponse, Json, Response},
};
use modkit::ProblemResponse;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "UP",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn serve_docs() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>User Management API</title>
  <script src="https://unpkg.com/@stoplight/elements@latest/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@latest/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="/openapi.json" router="hash" layout="sidebar"></elements-api>
</body>
</html>"#,
    )
}

pub async fn not_found(uri: Uri) -> Response {
    let problem = modkit::not_found(format!("No route for {}", uri.path()))
        .0
        .with_instance(uri.path());
    ProblemResponse(problem).into_response()
}
