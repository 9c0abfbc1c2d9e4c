// Perfis são endereçados pelo user_id do dono, não pelo _id do documento

use actix_web::{web, HttpResponse};

use crate::database::Database;
use crate::models::{
    CareerProfileResponse, UpsertCareerProfileRequest, UpsertUserProfileRequest, UserProfileResponse,
};
use crate::services::profile_service;
use crate::utils::AppError;

// ==================== CAREER PROFILE ====================

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/career-profile",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Career profile", body = CareerProfileResponse),
        (status = 404, description = "User has no career profile")
    )
)]
pub async fn get_career_profile(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let profile = profile_service::get_career_profile(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "profile": CareerProfileResponse::from(profile)
    })))
}

/// PUT cria o perfil na primeira chamada e depois atualiza
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/career-profile",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Owner user id")),
    request_body = UpsertCareerProfileRequest,
    responses(
        (status = 200, description = "Career profile saved", body = CareerProfileResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn upsert_career_profile(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<UpsertCareerProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = profile_service::upsert_career_profile(&db, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "profile": CareerProfileResponse::from(profile)
    })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/career-profile",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Career profile deleted"),
        (status = 404, description = "User has no career profile")
    )
)]
pub async fn delete_career_profile(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    profile_service::delete_career_profile(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Career profile deleted"
    })))
}

// ==================== USER PROFILE ====================

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/profile",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Personal profile", body = UserProfileResponse),
        (status = 404, description = "User has no profile")
    )
)]
pub async fn get_user_profile(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let profile = profile_service::get_user_profile(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "profile": UserProfileResponse::from(profile)
    })))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/profile",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Owner user id")),
    request_body = UpsertUserProfileRequest,
    responses(
        (status = 200, description = "Personal profile saved", body = UserProfileResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn upsert_user_profile(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<UpsertUserProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = profile_service::upsert_user_profile(&db, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "profile": UserProfileResponse::from(profile)
    })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/profile",
    tag = "Profiles",
    params(("user_id" = String, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Personal profile deleted"),
        (status = 404, description = "User has no profile")
    )
)]
pub async fn delete_user_profile(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    profile_service::delete_user_profile(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Profile deleted"
    })))
}
