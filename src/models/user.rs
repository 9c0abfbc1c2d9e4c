use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};

use super::schema::{IndexSpec, Schema, ValidationError, Validator};

/// Notification and visibility flags chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserPreferences {
    #[serde(default = "default_true")]
    pub email_notifications: bool,
    #[serde(default = "default_true")]
    pub teams_notifications: bool,
    #[serde(default)]
    pub open_to_mentoring: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            teams_notifications: true,
            open_to_mentoring: false,
        }
    }
}

/// Usuário (armazenado no MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Trimmed and lowercased before every write
    pub email: String,

    pub name: String,

    /// Microsoft identity (Entra ID object id), unique when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft_id: Option<String>,

    #[serde(default)]
    pub preferences: UserPreferences,

    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

impl Schema for User {
    const COLLECTION: &'static str = "users";

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["email"]).unique(),
            IndexSpec::ascending(&["microsoft_id"]).unique().sparse(),
            IndexSpec::text("user_text", &["name", "email"]),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new(Self::COLLECTION);
        v.email("email", &self.email);
        v.required("name", &self.name);
        if let Some(microsoft_id) = &self.microsoft_id {
            v.required("microsoft_id", microsoft_id);
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

/// Request para criar usuário
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub microsoft_id: Option<String>,
    pub preferences: Option<UserPreferences>,
}

impl From<CreateUserRequest> for User {
    fn from(request: CreateUserRequest) -> Self {
        User {
            id: None,
            email: User::normalize_email(&request.email),
            name: request.name.trim().to_string(),
            microsoft_id: request.microsoft_id,
            preferences: request.preferences.unwrap_or_default(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Distingue campo ausente (`None`) de `null` explícito (`Some(None)`)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request para atualizar usuário. `"microsoft_id": null` desvincula a conta.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub microsoft_id: Option<Option<String>>,
    pub preferences: Option<UserPreferences>,
}

impl UpdateUserRequest {
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = User::normalize_email(&email);
        }
        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(microsoft_id) = self.microsoft_id {
            user.microsoft_id = microsoft_id;
        }
        if let Some(preferences) = self.preferences {
            user.preferences = preferences;
        }
    }
}

/// Response de usuário
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub microsoft_id: Option<String>,
    pub preferences: UserPreferences,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: user.email,
            name: user.name,
            microsoft_id: user.microsoft_id,
            preferences: user.preferences,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
