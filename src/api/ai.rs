use actix_web::{web, HttpResponse};

use crate::services::ai_service::{self, CareerPathsRequest, CompletionClient, MentorMatchesRequest};
use crate::utils::AppError;

/// POST /api/ai/career-paths
/// Sugestões de carreira geradas a partir do perfil e dos objetivos
#[utoipa::path(
    post,
    path = "/api/ai/career-paths",
    tag = "AI",
    request_body = CareerPathsRequest,
    responses(
        (status = 200, description = "Parsed JSON returned by the completion"),
        (status = 502, description = "Completion failed or returned invalid JSON")
    )
)]
pub async fn career_paths(
    client: web::Data<dyn CompletionClient>,
    body: web::Json<CareerPathsRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🧭 POST /ai/career-paths");
    let paths = ai_service::career_paths(client.get_ref(), &body.profile, &body.goals).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "career_paths": paths
    })))
}

/// POST /api/ai/mentor-matches
#[utoipa::path(
    post,
    path = "/api/ai/mentor-matches",
    tag = "AI",
    request_body = MentorMatchesRequest,
    responses(
        (status = 200, description = "Parsed JSON returned by the completion"),
        (status = 502, description = "Completion failed or returned invalid JSON")
    )
)]
pub async fn mentor_matches(
    client: web::Data<dyn CompletionClient>,
    body: web::Json<MentorMatchesRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🤝 POST /ai/mentor-matches");
    let matches = ai_service::mentor_matches(client.get_ref(), &body.mentee, &body.candidates).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "matches": matches
    })))
}
