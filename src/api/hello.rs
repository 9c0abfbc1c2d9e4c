use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HelloQuery {
    pub name: Option<String>,
}

pub fn greeting(name: Option<&str>) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or("world");
    format!("Hello, {}!", name)
}

/// GET /api/hello?name=Ada
#[utoipa::path(
    get,
    path = "/api/hello",
    tag = "General",
    params(HelloQuery),
    responses(
        (status = 200, description = "Greeting message")
    )
)]
pub async fn hello(query: web::Query<HelloQuery>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": greeting(query.name.as_deref())
    }))
}
