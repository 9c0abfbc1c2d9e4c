use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::database::Database;
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::user_service;
use crate::utils::AppError;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    pub email: String,
}

/// GET /api/users - Lista usuários ordenados por nome
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users")
    )
)]
pub async fn list_users(db: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let users: Vec<UserResponse> = user_service::list_users(&db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": users.len(),
        "users": users
    })))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email or Microsoft id already registered")
    )
)]
pub async fn create_user(
    db: web::Data<Database>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::create_user(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

/// GET /api/users/by-email?email=ada@contoso.com
#[utoipa::path(
    get,
    path = "/api/users/by-email",
    tag = "Users",
    params(EmailQuery),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "No user with this email")
    )
)]
pub async fn get_user_by_email(
    db: web::Data<Database>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::find_by_email(&db, &query.email).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ObjectId")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Invalid id"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    let user = user_service::get_user(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ObjectId")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or Microsoft id already registered")
    )
)]
pub async fn update_user(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = user_service::update_user(&db, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ObjectId")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    user_service::delete_user(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User deleted"
    })))
}
