use actix_web::{web, HttpResponse};

use crate::database::Database;
use crate::models::{
    AddProgressRequest, AddSessionRequest, Feedback, Mentorship, MentorshipQuery,
    MentorshipResponse, PairQuery, RequestMentorshipRequest, UpdateMentorshipStatusRequest,
};
use crate::services::mentorship_service;
use crate::utils::AppError;

fn mentorship_json(mentorship: Mentorship) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "mentorship": MentorshipResponse::from(mentorship)
    }))
}

/// GET /api/mentorships?mentor_id=&mentee_id=
#[utoipa::path(
    get,
    path = "/api/mentorships",
    tag = "Mentorships",
    params(MentorshipQuery),
    responses(
        (status = 200, description = "Mentorships matching the filters")
    )
)]
pub async fn list_mentorships(
    db: web::Data<Database>,
    query: web::Query<MentorshipQuery>,
) -> Result<HttpResponse, AppError> {
    let mentorships: Vec<MentorshipResponse> = mentorship_service::list_mentorships(&db, &query)
        .await?
        .into_iter()
        .map(MentorshipResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": mentorships.len(),
        "mentorships": mentorships
    })))
}

#[utoipa::path(
    post,
    path = "/api/mentorships",
    tag = "Mentorships",
    request_body = RequestMentorshipRequest,
    responses(
        (status = 201, description = "Mentorship requested", body = MentorshipResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn request_mentorship(
    db: web::Data<Database>,
    body: web::Json<RequestMentorshipRequest>,
) -> Result<HttpResponse, AppError> {
    let mentorship = mentorship_service::request_mentorship(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "mentorship": MentorshipResponse::from(mentorship)
    })))
}

/// GET /api/mentorships/pair - Inclui o plano de consulta usado
#[utoipa::path(
    get,
    path = "/api/mentorships/pair",
    tag = "Mentorships",
    params(PairQuery),
    responses(
        (status = 200, description = "Mentorships between the pair and the index used")
    )
)]
pub async fn find_by_pair(
    db: web::Data<Database>,
    query: web::Query<PairQuery>,
) -> Result<HttpResponse, AppError> {
    let (mentorships, plan) =
        mentorship_service::find_by_pair(&db, &query.mentor_id, &query.mentee_id).await?;
    let mentorships: Vec<MentorshipResponse> =
        mentorships.into_iter().map(MentorshipResponse::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": mentorships.len(),
        "mentorships": mentorships,
        "query_plan": plan
    })))
}

#[utoipa::path(
    get,
    path = "/api/mentorships/{id}",
    tag = "Mentorships",
    params(("id" = String, Path, description = "Mentorship ObjectId")),
    responses(
        (status = 200, description = "Mentorship found", body = MentorshipResponse),
        (status = 404, description = "Mentorship not found")
    )
)]
pub async fn get_mentorship(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(mentorship_json(mentorship_service::get_mentorship(&db, &path).await?))
}

#[utoipa::path(
    delete,
    path = "/api/mentorships/{id}",
    tag = "Mentorships",
    params(("id" = String, Path, description = "Mentorship ObjectId")),
    responses(
        (status = 200, description = "Mentorship deleted"),
        (status = 404, description = "Mentorship not found")
    )
)]
pub async fn delete_mentorship(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    mentorship_service::delete_mentorship(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Mentorship deleted"
    })))
}

#[utoipa::path(
    put,
    path = "/api/mentorships/{id}/status",
    tag = "Mentorships",
    params(("id" = String, Path, description = "Mentorship ObjectId")),
    request_body = UpdateMentorshipStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = MentorshipResponse),
        (status = 400, description = "Status outside its enum"),
        (status = 404, description = "Mentorship not found")
    )
)]
pub async fn update_status(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<UpdateMentorshipStatusRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(mentorship_json(
        mentorship_service::update_status(&db, &path, body.into_inner()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/mentorships/{id}/sessions",
    tag = "Mentorships",
    params(("id" = String, Path, description = "Mentorship ObjectId")),
    request_body = AddSessionRequest,
    responses(
        (status = 200, description = "Session scheduled", body = MentorshipResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Mentorship not found")
    )
)]
pub async fn add_session(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<AddSessionRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(mentorship_json(
        mentorship_service::add_session(&db, &path, body.into_inner()).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/mentorships/{id}/sessions/{index}/complete",
    tag = "Mentorships",
    params(
        ("id" = String, Path, description = "Mentorship ObjectId"),
        ("index" = usize, Path, description = "Zero-based session position")
    ),
    responses(
        (status = 200, description = "Session marked completed", body = MentorshipResponse),
        (status = 404, description = "Mentorship or session not found")
    )
)]
pub async fn complete_session(
    db: web::Data<Database>,
    path: web::Path<(String, usize)>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    Ok(mentorship_json(
        mentorship_service::complete_session(&db, &id, index).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/mentorships/{id}/progress",
    tag = "Mentorships",
    params(("id" = String, Path, description = "Mentorship ObjectId")),
    request_body = AddProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = MentorshipResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Mentorship not found")
    )
)]
pub async fn add_progress(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<AddProgressRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(mentorship_json(
        mentorship_service::add_progress(&db, &path, body.into_inner()).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/mentorships/{id}/feedback",
    tag = "Mentorships",
    params(("id" = String, Path, description = "Mentorship ObjectId")),
    request_body = Feedback,
    responses(
        (status = 200, description = "Feedback saved", body = MentorshipResponse),
        (status = 400, description = "Rating outside 1-5"),
        (status = 404, description = "Mentorship not found")
    )
)]
pub async fn set_feedback(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<Feedback>,
) -> Result<HttpResponse, AppError> {
    Ok(mentorship_json(
        mentorship_service::set_feedback(&db, &path, body.into_inner()).await?,
    ))
}
