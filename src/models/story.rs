use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::schema::{
    parse_enum, string_enum, IndexSpec, Schema, ValidationError, Validator,
};

string_enum! {
    /// Estágio de carreira do autor quando a história aconteceu
    pub enum CareerStage {
        Early => "early",
        Mid => "mid",
        Senior => "senior",
        Leadership => "leadership",
    }
}

string_enum! {
    pub enum Visibility {
        Public => "public",
        Organization => "organization",
        Private => "private",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Comment {
    pub comment_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: i64,
}

/// História de carreira (armazenada no MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub author_id: String,

    pub title: String,

    pub content: String,

    pub career_stage: CareerStage,

    pub visibility: Visibility,

    #[serde(default)]
    pub tags: Vec<String>,

    /// IDs dos usuários que curtiram
    #[serde(default)]
    pub likes: Vec<String>,

    #[serde(default)]
    pub comments: Vec<Comment>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Schema for Story {
    const COLLECTION: &'static str = "stories";

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["author_id"]),
            IndexSpec::text("story_text", &["title", "content", "tags"]),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new(Self::COLLECTION);
        v.required("author_id", &self.author_id);
        v.required("title", &self.title);
        v.required("content", &self.content);
        for (i, comment) in self.comments.iter().enumerate() {
            v.required(&format!("comments.{}.author_id", i), &comment.author_id);
            v.required(&format!("comments.{}.content", i), &comment.content);
        }
        v.finish()
    }

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn stamp_created(&mut self, now: i64) {
        self.created_at = now;
        self.updated_at = now;
    }
}

/// Request para criar história. Campos enum chegam como texto e são
/// validados na conversão.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateStoryRequest {
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub career_stage: String,
    pub visibility: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TryFrom<CreateStoryRequest> for Story {
    type Error = ValidationError;

    fn try_from(request: CreateStoryRequest) -> Result<Self, Self::Error> {
        let career_stage = parse_enum(Story::COLLECTION, "career_stage", &request.career_stage)?;
        let visibility = match request.visibility.as_deref() {
            Some(value) => parse_enum(Story::COLLECTION, "visibility", value)?,
            None => Visibility::Public,
        };

        Ok(Story {
            id: None,
            author_id: request.author_id,
            title: request.title.trim().to_string(),
            content: request.content,
            career_stage,
            visibility,
            tags: request.tags,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: 0,
            updated_at: 0,
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub career_stage: Option<String>,
    pub visibility: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateStoryRequest {
    pub fn apply(self, story: &mut Story) -> Result<(), ValidationError> {
        if let Some(stage) = &self.career_stage {
            story.career_stage = parse_enum(Story::COLLECTION, "career_stage", stage)?;
        }
        if let Some(visibility) = &self.visibility {
            story.visibility = parse_enum(Story::COLLECTION, "visibility", visibility)?;
        }
        if let Some(title) = self.title {
            story.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            story.content = content;
        }
        if let Some(tags) = self.tags {
            story.tags = tags;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddCommentRequest {
    pub author_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LikeStoryRequest {
    pub user_id: String,
}

/// Filtros opcionais da listagem
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoryQuery {
    pub author_id: Option<String>,
    pub career_stage: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StoryResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub career_stage: CareerStage,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub likes: Vec<String>,
    pub like_count: usize,
    pub comments: Vec<Comment>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Story> for StoryResponse {
    fn from(story: Story) -> Self {
        StoryResponse {
            id: story.id.map(|id| id.to_hex()).unwrap_or_default(),
            author_id: story.author_id,
            title: story.title,
            content: story.content,
            career_stage: story.career_stage,
            visibility: story.visibility,
            tags: story.tags,
            like_count: story.likes.len(),
            likes: story.likes,
            comments: story.comments,
            created_at: story.created_at,
            updated_at: story.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(stage: &str) -> CreateStoryRequest {
        CreateStoryRequest {
            author_id: "u1".into(),
            title: "My first promotion".into(),
            content: "It took a while.".into(),
            career_stage: stage.into(),
            visibility: None,
            tags: vec![],
        }
    }

    #[test]
    fn out_of_enum_career_stage_is_rejected() {
        let err = Story::try_from(request("intern")).unwrap_err();
        assert!(err.has_field("career_stage"));
        assert!(err.to_string().contains("early, mid, senior, leadership"));
    }

    #[test]
    fn visibility_defaults_to_public() {
        let story = Story::try_from(request("senior")).unwrap();
        assert_eq!(story.career_stage, CareerStage::Senior);
        assert_eq!(story.visibility, Visibility::Public);
    }

    #[test]
    fn unknown_stage_in_stored_document_fails_to_decode() {
        let document = mongodb::bson::doc! {
            "author_id": "u1",
            "title": "t",
            "content": "c",
            "career_stage": "intern",
            "visibility": "public",
            "created_at": 0_i64,
            "updated_at": 0_i64,
        };
        assert!(mongodb::bson::from_document::<Story>(document).is_err());
    }

    #[test]
    fn update_rejects_bad_visibility_without_touching_story() {
        let mut story = Story::try_from(request("mid")).unwrap();
        let err = UpdateStoryRequest {
            title: Some("changed".into()),
            visibility: Some("secret".into()),
            ..Default::default()
        }
        .apply(&mut story)
        .unwrap_err();

        assert!(err.has_field("visibility"));
        assert_eq!(story.title, "My first promotion");
    }
}
