use mongodb::bson::doc;

use crate::{
    database::{parse_object_id, Database},
    models::{CreateUserRequest, UpdateUserRequest, User},
    utils::AppError,
};

pub async fn create_user(db: &Database, request: CreateUserRequest) -> Result<User, AppError> {
    let user = db.repo::<User>().insert(User::from(request)).await?;
    log::info!("👤 User created: {}", user.email);
    Ok(user)
}

pub async fn list_users(db: &Database) -> Result<Vec<User>, AppError> {
    let mut users = db.repo::<User>().find(doc! {}).await?;
    users.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(users)
}

pub async fn get_user(db: &Database, id: &str) -> Result<User, AppError> {
    db.repo::<User>().get(parse_object_id(id)?).await
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<User, AppError> {
    let email = User::normalize_email(email);
    db.repo::<User>()
        .find_one(doc! { "email": &email })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user with email {}", email)))
}

pub async fn update_user(db: &Database, id: &str, request: UpdateUserRequest) -> Result<User, AppError> {
    let repo = db.repo::<User>();
    let mut user = repo.get(parse_object_id(id)?).await?;
    request.apply(&mut user);
    repo.save_fields(user, &["email", "name", "microsoft_id", "preferences"]).await
}

pub async fn delete_user(db: &Database, id: &str) -> Result<(), AppError> {
    if db.repo::<User>().delete(parse_object_id(id)?).await? {
        log::info!("🗑️  User deleted: {}", id);
        Ok(())
    } else {
        Err(AppError::NotFound(format!("users {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{test_support::database, StoreError};

    fn request(email: &str, microsoft_id: Option<&str>) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            name: "Ada Lovelace".into(),
            microsoft_id: microsoft_id.map(String::from),
            preferences: None,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = database().await;
        create_user(&db, request("ada@contoso.com", None)).await.unwrap();

        // Normalization makes these the same address
        let err = create_user(&db, request("  ADA@contoso.com", None)).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::DuplicateKey { ref index, .. }) if index == "email_1"
        ));
    }

    #[tokio::test]
    async fn duplicate_microsoft_id_is_rejected() {
        let db = database().await;
        create_user(&db, request("ada@contoso.com", Some("ms-1"))).await.unwrap();

        let err = create_user(&db, request("grace@contoso.com", Some("ms-1"))).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::DuplicateKey { ref index, .. }) if index == "microsoft_id_1"
        ));
    }

    #[tokio::test]
    async fn users_without_microsoft_id_coexist() {
        let db = database().await;
        create_user(&db, request("ada@contoso.com", None)).await.unwrap();
        create_user(&db, request("grace@contoso.com", None)).await.unwrap();

        assert_eq!(list_users(&db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let db = database().await;
        create_user(&db, request("ada@contoso.com", None)).await.unwrap();
        let grace = create_user(&db, request("grace@contoso.com", None)).await.unwrap();
        let grace_id = grace.id.unwrap().to_hex();

        let err = update_user(
            &db,
            &grace_id,
            UpdateUserRequest {
                email: Some("ada@contoso.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::DuplicateKey { .. })));

        let unchanged = get_user(&db, &grace_id).await.unwrap();
        assert_eq!(unchanged.email, "grace@contoso.com");
    }

    #[tokio::test]
    async fn unlinked_microsoft_id_can_be_claimed_by_another_user() {
        let db = database().await;
        let ada = create_user(&db, request("ada@contoso.com", Some("ms-1"))).await.unwrap();
        let grace = create_user(&db, request("grace@contoso.com", None)).await.unwrap();
        let ada_id = ada.id.unwrap().to_hex();
        let grace_id = grace.id.unwrap().to_hex();

        let claim = || UpdateUserRequest {
            microsoft_id: Some(Some("ms-1".into())),
            ..Default::default()
        };
        assert!(update_user(&db, &grace_id, claim()).await.is_err());

        let ada = update_user(
            &db,
            &ada_id,
            UpdateUserRequest {
                microsoft_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(ada.microsoft_id.is_none());
        assert!(get_user(&db, &ada_id).await.unwrap().microsoft_id.is_none());

        let grace = update_user(&db, &grace_id, claim()).await.unwrap();
        assert_eq!(grace.microsoft_id.as_deref(), Some("ms-1"));
    }

    #[tokio::test]
    async fn find_by_email_is_case_insensitive() {
        let db = database().await;
        create_user(&db, request("ada@contoso.com", None)).await.unwrap();

        let found = find_by_email(&db, "Ada@Contoso.com").await.unwrap();
        assert_eq!(found.name, "Ada Lovelace");
        assert!(matches!(
            find_by_email(&db, "nobody@contoso.com").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let db = database().await;
        let user = create_user(&db, request("ada@contoso.com", None)).await.unwrap();
        let id = user.id.unwrap().to_hex();

        delete_user(&db, &id).await.unwrap();
        assert!(matches!(delete_user(&db, &id).await, Err(AppError::NotFound(_))));
    }
}
