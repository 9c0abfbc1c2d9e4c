use mongodb::bson::{doc, to_bson, Document};

use crate::{
    database::{parse_object_id, Database},
    models::{
        now_ts, parse_enum, AddCommentRequest, CareerStage, Comment, CreateStoryRequest,
        EnumField, Schema, Story, StoryQuery, UpdateStoryRequest, Visibility,
    },
    utils::AppError,
};

/// Fields owned by the edit endpoint; likes and comments are only ever
/// changed through their own atomic updates.
const EDITABLE_FIELDS: &[&str] = &["title", "content", "career_stage", "visibility", "tags"];

/// Builds the equality filter for a listing; enum filters are checked
/// against their allowed values.
fn list_filter(query: &StoryQuery) -> Result<Document, AppError> {
    let mut filter = doc! {};
    if let Some(author_id) = &query.author_id {
        filter.insert("author_id", author_id);
    }
    if let Some(stage) = &query.career_stage {
        let stage: CareerStage = parse_enum(Story::COLLECTION, "career_stage", stage)?;
        filter.insert("career_stage", stage.as_str());
    }
    if let Some(visibility) = &query.visibility {
        let visibility: Visibility = parse_enum(Story::COLLECTION, "visibility", visibility)?;
        filter.insert("visibility", visibility.as_str());
    }
    Ok(filter)
}

/// Lists stories, newest first
pub async fn list_stories(db: &Database, query: &StoryQuery) -> Result<Vec<Story>, AppError> {
    let mut stories = db.repo::<Story>().find(list_filter(query)?).await?;
    stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(stories)
}

pub async fn create_story(db: &Database, request: CreateStoryRequest) -> Result<Story, AppError> {
    let story = Story::try_from(request)?;
    let story = db.repo::<Story>().insert(story).await?;
    log::info!("📖 Story created by {}: {}", story.author_id, story.title);
    Ok(story)
}

pub async fn get_story(db: &Database, id: &str) -> Result<Story, AppError> {
    db.repo::<Story>().get(parse_object_id(id)?).await
}

pub async fn update_story(db: &Database, id: &str, request: UpdateStoryRequest) -> Result<Story, AppError> {
    let repo = db.repo::<Story>();
    let mut story = repo.get(parse_object_id(id)?).await?;
    request.apply(&mut story)?;
    repo.save_fields(story, EDITABLE_FIELDS).await
}

pub async fn delete_story(db: &Database, id: &str) -> Result<(), AppError> {
    if db.repo::<Story>().delete(parse_object_id(id)?).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("stories {}", id)))
    }
}

pub async fn add_comment(db: &Database, id: &str, request: AddCommentRequest) -> Result<Story, AppError> {
    let repo = db.repo::<Story>();
    let oid = parse_object_id(id)?;

    let comment = Comment {
        comment_id: uuid::Uuid::new_v4().to_string(),
        author_id: request.author_id,
        content: request.content,
        created_at: now_ts(),
    };

    // Valida o comentário no documento atual antes do $push
    let mut story = repo.get(oid).await?;
    story.comments.push(comment.clone());
    story.validate()?;

    repo.update(doc! { "_id": oid }, doc! { "$push": { "comments": to_bson(&comment)? } })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("stories {}", id)))
}

/// Likes are a set: liking twice keeps a single entry.
pub async fn like_story(db: &Database, id: &str, user_id: &str) -> Result<Story, AppError> {
    db.repo::<Story>()
        .update(
            doc! { "_id": parse_object_id(id)? },
            doc! { "$addToSet": { "likes": user_id } },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("stories {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{database, yielding_database};

    fn request(author: &str, stage: &str, visibility: Option<&str>) -> CreateStoryRequest {
        CreateStoryRequest {
            author_id: author.into(),
            title: "Switching to management".into(),
            content: "What I learned".into(),
            career_stage: stage.into(),
            visibility: visibility.map(String::from),
            tags: vec!["leadership".into()],
        }
    }

    #[tokio::test]
    async fn out_of_enum_career_stage_is_not_written() {
        let db = database().await;

        let err = create_story(&db, request("u1", "principal", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.has_field("career_stage")));
        assert!(list_stories(&db, &StoryQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_filters_by_author_and_stage() {
        let db = database().await;
        create_story(&db, request("u1", "early", None)).await.unwrap();
        create_story(&db, request("u1", "senior", Some("private"))).await.unwrap();
        create_story(&db, request("u2", "senior", None)).await.unwrap();

        let by_author = list_stories(
            &db,
            &StoryQuery {
                author_id: Some("u1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_author.len(), 2);

        let senior_public = list_stories(
            &db,
            &StoryQuery {
                career_stage: Some("senior".into()),
                visibility: Some("public".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(senior_public.len(), 1);
        assert_eq!(senior_public[0].author_id, "u2");

        let bad = list_stories(
            &db,
            &StoryQuery {
                career_stage: Some("junior".into()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn comments_and_likes() {
        let db = database().await;
        let story = create_story(&db, request("u1", "mid", None)).await.unwrap();
        let id = story.id.unwrap().to_hex();

        let story = add_comment(
            &db,
            &id,
            AddCommentRequest {
                author_id: "u2".into(),
                content: "Great read".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(story.comments.len(), 1);
        assert!(!story.comments[0].comment_id.is_empty());

        like_story(&db, &id, "u3").await.unwrap();
        let story = like_story(&db, &id, "u3").await.unwrap();
        assert_eq!(story.likes, vec!["u3".to_string()]);

        let empty = add_comment(
            &db,
            &id,
            AddCommentRequest {
                author_id: "u2".into(),
                content: " ".into(),
            },
        )
        .await;
        assert!(matches!(empty, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn concurrent_comments_and_likes_are_all_kept() {
        let db = yielding_database().await;
        let story = create_story(&db, request("u1", "mid", None)).await.unwrap();
        let id = story.id.unwrap().to_hex();

        let comment = |author: &str| AddCommentRequest {
            author_id: author.into(),
            content: "Nice".into(),
        };
        let (a, b) = tokio::join!(
            add_comment(&db, &id, comment("u2")),
            add_comment(&db, &id, comment("u3"))
        );
        a.unwrap();
        b.unwrap();

        let (a, b, c) = tokio::join!(
            like_story(&db, &id, "u2"),
            like_story(&db, &id, "u3"),
            like_story(&db, &id, "u3")
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let stored = get_story(&db, &id).await.unwrap();
        assert_eq!(stored.comments.len(), 2);
        assert_eq!(stored.likes.len(), 2);
    }

    #[tokio::test]
    async fn edit_does_not_drop_likes_added_meanwhile() {
        let db = yielding_database().await;
        let story = create_story(&db, request("u1", "mid", None)).await.unwrap();
        let id = story.id.unwrap().to_hex();

        let edit = UpdateStoryRequest {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let (edited, liked) = tokio::join!(update_story(&db, &id, edit), like_story(&db, &id, "u5"));
        edited.unwrap();
        liked.unwrap();

        let stored = get_story(&db, &id).await.unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.likes, vec!["u5".to_string()]);
    }

    #[tokio::test]
    async fn like_on_missing_story_is_not_found() {
        let db = database().await;
        assert!(matches!(
            like_story(&db, "64b7f0c2a1b2c3d4e5f60718", "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_changes_stage_and_keeps_enum_constraint() {
        let db = database().await;
        let story = create_story(&db, request("u1", "mid", None)).await.unwrap();
        let id = story.id.unwrap().to_hex();

        let story = update_story(
            &db,
            &id,
            UpdateStoryRequest {
                career_stage: Some("leadership".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(story.career_stage, CareerStage::Leadership);

        let err = update_story(
            &db,
            &id,
            UpdateStoryRequest {
                career_stage: Some("retired".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get_story(&db, &id).await.unwrap().career_stage, CareerStage::Leadership);
    }
}
