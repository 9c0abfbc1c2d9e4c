use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::schema::{IndexSpec, Schema, ValidationError, Validator};

/// Perfil pessoal exibido no app (um por usuário)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,

    pub display_name: String,

    #[serde(default)]
    pub job_title: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub career_goals: Vec<String>,

    #[serde(default)]
    pub mentoring_interests: Vec<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

const MAX_BIO_CHARS: usize = 2000;

impl UserProfile {
    pub fn new(user_id: &str, display_name: &str) -> Self {
        UserProfile {
            id: None,
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            job_title: None,
            department: None,
            bio: None,
            avatar_url: None,
            career_goals: Vec::new(),
            mentoring_interests: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Schema for UserProfile {
    const COLLECTION: &'static str = "user_profiles";

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["user_id"]).unique(),
            IndexSpec::text(
                "user_profile_text",
                &["display_name", "job_title", "department", "bio"],
            ),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new(Self::COLLECTION);
        v.required("user_id", &self.user_id);
        v.required("display_name", &self.display_name);
        if let Some(bio) = &self.bio {
            if bio.chars().count() > MAX_BIO_CHARS {
                v.error("bio", format!("must be at most {} characters", MAX_BIO_CHARS));
            }
        }
        if let Some(url) = &self.avatar_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                v.error("avatar_url", "must be an http(s) URL");
            }
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

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpsertUserProfileRequest {
    pub display_name: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub career_goals: Option<Vec<String>>,
    pub mentoring_interests: Option<Vec<String>>,
}

impl UpsertUserProfileRequest {
    pub fn apply(self, profile: &mut UserProfile) -> Vec<&'static str> {
        let mut touched = Vec::new();
        if let Some(name) = self.display_name {
            profile.display_name = name.trim().to_string();
            touched.push("display_name");
        }
        if let Some(title) = self.job_title {
            profile.job_title = Some(title);
            touched.push("job_title");
        }
        if let Some(department) = self.department {
            profile.department = Some(department);
            touched.push("department");
        }
        if let Some(bio) = self.bio {
            profile.bio = Some(bio);
            touched.push("bio");
        }
        if let Some(url) = self.avatar_url {
            profile.avatar_url = Some(url);
            touched.push("avatar_url");
        }
        if let Some(goals) = self.career_goals {
            profile.career_goals = goals;
            touched.push("career_goals");
        }
        if let Some(interests) = self.mentoring_interests {
            profile.mentoring_interests = interests;
            touched.push("mentoring_interests");
        }
        touched
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserProfileResponse {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub career_goals: Vec<String>,
    pub mentoring_interests: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        UserProfileResponse {
            id: profile.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: profile.user_id,
            display_name: profile.display_name,
            job_title: profile.job_title,
            department: profile.department,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            career_goals: profile.career_goals,
            mentoring_interests: profile.mentoring_interests,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_required() {
        let profile = UserProfile::new("u1", " ");
        assert!(profile.validate().unwrap_err().has_field("display_name"));
    }

    #[test]
    fn avatar_must_be_a_url() {
        let mut profile = UserProfile::new("u1", "Ada");
        profile.avatar_url = Some("avatar.png".into());
        assert!(profile.validate().unwrap_err().has_field("avatar_url"));

        profile.avatar_url = Some("https://cdn.contoso.com/ada.png".into());
        assert!(profile.validate().is_ok());
    }
}
