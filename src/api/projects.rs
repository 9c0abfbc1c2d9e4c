use actix_web::{web, HttpResponse};

use crate::database::Database;
use crate::models::{
    ApprovalDecisionRequest, CreateProjectRequest, JoinProjectRequest, Project, ProjectQuery,
    ProjectResponse, UpdateProjectRequest,
};
use crate::services::project_service;
use crate::utils::AppError;

fn project_json(project: Project) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "project": ProjectResponse::from(project)
    }))
}

/// GET /api/projects?status=&creator_id=
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "Projects",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Projects matching the filters"),
        (status = 400, description = "Status outside its enum")
    )
)]
pub async fn list_projects(
    db: web::Data<Database>,
    query: web::Query<ProjectQuery>,
) -> Result<HttpResponse, AppError> {
    let projects: Vec<ProjectResponse> = project_service::list_projects(&db, &query)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": projects.len(),
        "projects": projects
    })))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_project(
    db: web::Data<Database>,
    body: web::Json<CreateProjectRequest>,
) -> Result<HttpResponse, AppError> {
    let project = project_service::create_project(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "project": ProjectResponse::from(project)
    })))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ObjectId")),
    responses(
        (status = 200, description = "Project found", body = ProjectResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(project_json(project_service::get_project(&db, &path).await?))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ObjectId")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn update_project(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<UpdateProjectRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(project_json(project_service::update_project(&db, &path, body.into_inner()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ObjectId")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    project_service::delete_project(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Project deleted"
    })))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/participants",
    tag = "Projects",
    params(("id" = String, Path, description = "Project ObjectId")),
    request_body = JoinProjectRequest,
    responses(
        (status = 200, description = "Joined with pending manager approval", body = ProjectResponse),
        (status = 404, description = "Project not found"),
        (status = 409, description = "User already joined")
    )
)]
pub async fn join_project(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<JoinProjectRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(project_json(project_service::join_project(&db, &path, body.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}/participants/{user_id}/approval",
    tag = "Projects",
    params(
        ("id" = String, Path, description = "Project ObjectId"),
        ("user_id" = String, Path, description = "Participant user id")
    ),
    request_body = ApprovalDecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = ProjectResponse),
        (status = 400, description = "Decision must be approved or rejected"),
        (status = 404, description = "Project or participant not found")
    )
)]
pub async fn decide_approval(
    db: web::Data<Database>,
    path: web::Path<(String, String)>,
    body: web::Json<ApprovalDecisionRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, user_id) = path.into_inner();
    Ok(project_json(
        project_service::decide_approval(&db, &id, &user_id, body.into_inner()).await?,
    ))
}
