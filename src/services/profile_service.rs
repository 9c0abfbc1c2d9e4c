// Perfis são indexados por user_id (único): upsert cria na primeira
// chamada e depois grava só os campos enviados.

use mongodb::bson::doc;

use crate::{
    database::Database,
    models::{
        CareerProfile, UpsertCareerProfileRequest, UpsertUserProfileRequest, UserProfile,
    },
    utils::AppError,
};

// ==================== CAREER PROFILE ====================

pub async fn get_career_profile(db: &Database, user_id: &str) -> Result<CareerProfile, AppError> {
    db.repo::<CareerProfile>()
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("career profile for user {}", user_id)))
}

pub async fn upsert_career_profile(
    db: &Database,
    user_id: &str,
    request: UpsertCareerProfileRequest,
) -> Result<CareerProfile, AppError> {
    let repo = db.repo::<CareerProfile>();

    match repo.find_one(doc! { "user_id": user_id }).await? {
        Some(mut profile) => {
            let touched = request.apply(&mut profile);
            repo.save_fields(profile, &touched).await
        }
        None => {
            let mut profile = CareerProfile::new(user_id);
            request.apply(&mut profile);
            let profile = repo.insert(profile).await?;
            log::info!("📝 Career profile created for user {}", user_id);
            Ok(profile)
        }
    }
}

pub async fn delete_career_profile(db: &Database, user_id: &str) -> Result<(), AppError> {
    let profile = get_career_profile(db, user_id).await?;
    if let Some(id) = profile.id {
        db.repo::<CareerProfile>().delete(id).await?;
    }
    Ok(())
}

// ==================== USER PROFILE ====================

pub async fn get_user_profile(db: &Database, user_id: &str) -> Result<UserProfile, AppError> {
    db.repo::<UserProfile>()
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile for user {}", user_id)))
}

pub async fn upsert_user_profile(
    db: &Database,
    user_id: &str,
    request: UpsertUserProfileRequest,
) -> Result<UserProfile, AppError> {
    let repo = db.repo::<UserProfile>();

    match repo.find_one(doc! { "user_id": user_id }).await? {
        Some(mut profile) => {
            let touched = request.apply(&mut profile);
            repo.save_fields(profile, &touched).await
        }
        None => {
            let mut profile = UserProfile::new(user_id, "");
            request.apply(&mut profile);
            let profile = repo.insert(profile).await?;
            log::info!("📝 Profile created for user {}", user_id);
            Ok(profile)
        }
    }
}

pub async fn delete_user_profile(db: &Database, user_id: &str) -> Result<(), AppError> {
    let profile = get_user_profile(db, user_id).await?;
    if let Some(id) = profile.id {
        db.repo::<UserProfile>().delete(id).await?;
    }
    Ok(())
}
