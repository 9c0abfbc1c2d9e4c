use actix_web::{web, HttpResponse};

use crate::database::Database;
use crate::models::{
    AddCommentRequest, CreateStoryRequest, LikeStoryRequest, Story, StoryQuery, StoryResponse,
    UpdateStoryRequest,
};
use crate::services::story_service;
use crate::utils::AppError;

fn story_json(story: Story) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "story": StoryResponse::from(story)
    }))
}

/// GET /api/stories?author_id=&career_stage=&visibility=
#[utoipa::path(
    get,
    path = "/api/stories",
    tag = "Stories",
    params(StoryQuery),
    responses(
        (status = 200, description = "Stories matching the filters"),
        (status = 400, description = "Filter value outside its enum")
    )
)]
pub async fn list_stories(
    db: web::Data<Database>,
    query: web::Query<StoryQuery>,
) -> Result<HttpResponse, AppError> {
    let stories: Vec<StoryResponse> = story_service::list_stories(&db, &query)
        .await?
        .into_iter()
        .map(StoryResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": stories.len(),
        "stories": stories
    })))
}

#[utoipa::path(
    post,
    path = "/api/stories",
    tag = "Stories",
    request_body = CreateStoryRequest,
    responses(
        (status = 201, description = "Story created", body = StoryResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_story(
    db: web::Data<Database>,
    body: web::Json<CreateStoryRequest>,
) -> Result<HttpResponse, AppError> {
    let story = story_service::create_story(&db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "story": StoryResponse::from(story)
    })))
}

#[utoipa::path(
    get,
    path = "/api/stories/{id}",
    tag = "Stories",
    params(("id" = String, Path, description = "Story ObjectId")),
    responses(
        (status = 200, description = "Story found", body = StoryResponse),
        (status = 404, description = "Story not found")
    )
)]
pub async fn get_story(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    Ok(story_json(story_service::get_story(&db, &path).await?))
}

#[utoipa::path(
    put,
    path = "/api/stories/{id}",
    tag = "Stories",
    params(("id" = String, Path, description = "Story ObjectId")),
    request_body = UpdateStoryRequest,
    responses(
        (status = 200, description = "Story updated", body = StoryResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Story not found")
    )
)]
pub async fn update_story(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<UpdateStoryRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(story_json(story_service::update_story(&db, &path, body.into_inner()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/stories/{id}",
    tag = "Stories",
    params(("id" = String, Path, description = "Story ObjectId")),
    responses(
        (status = 200, description = "Story deleted"),
        (status = 404, description = "Story not found")
    )
)]
pub async fn delete_story(db: web::Data<Database>, path: web::Path<String>) -> Result<HttpResponse, AppError> {
    story_service::delete_story(&db, &path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Story deleted"
    })))
}

#[utoipa::path(
    post,
    path = "/api/stories/{id}/comments",
    tag = "Stories",
    params(("id" = String, Path, description = "Story ObjectId")),
    request_body = AddCommentRequest,
    responses(
        (status = 200, description = "Comment added", body = StoryResponse),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "Story not found")
    )
)]
pub async fn add_comment(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<AddCommentRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(story_json(story_service::add_comment(&db, &path, body.into_inner()).await?))
}

/// Curtir duas vezes não duplica
#[utoipa::path(
    post,
    path = "/api/stories/{id}/likes",
    tag = "Stories",
    params(("id" = String, Path, description = "Story ObjectId")),
    request_body = LikeStoryRequest,
    responses(
        (status = 200, description = "Story liked", body = StoryResponse),
        (status = 404, description = "Story not found")
    )
)]
pub async fn like_story(
    db: web::Data<Database>,
    path: web::Path<String>,
    body: web::Json<LikeStoryRequest>,
) -> Result<HttpResponse, AppError> {
    Ok(story_json(story_service::like_story(&db, &path, &body.user_id).await?))
}
