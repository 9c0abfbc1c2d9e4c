use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use super::schema::{
    parse_enum, string_enum, IndexSpec, Schema, ValidationError, Validator,
};

string_enum! {
    pub enum MentorshipStatus {
        Requested => "requested",
        Active => "active",
        Completed => "completed",
        Declined => "declined",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Session {
    /// Unix timestamp
    pub scheduled_at: i64,
    pub duration_minutes: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgressEntry {
    pub milestone: String,
    #[serde(default)]
    pub note: Option<String>,
    pub recorded_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Feedback {
    #[serde(default)]
    pub mentor_rating: Option<i64>,
    #[serde(default)]
    pub mentee_rating: Option<i64>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Mentoria entre dois usuários.
///
/// O par (mentor_id, mentee_id) tem índice composto mas não é único:
/// o mesmo par pode ter mais de uma mentoria ao longo do tempo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentorship {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub mentor_id: String,

    pub mentee_id: String,

    pub status: MentorshipStatus,

    #[serde(default)]
    pub goals: Vec<String>,

    #[serde(default)]
    pub sessions: Vec<Session>,

    #[serde(default)]
    pub progress: Vec<ProgressEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,

    pub created_at: i64,
    pub updated_at: i64,
}

pub const MAX_SESSION_MINUTES: i64 = 480;

impl Mentorship {
    /// Filter served by the `mentor_id_1_mentee_id_1` index.
    pub fn pair_filter(mentor_id: &str, mentee_id: &str) -> Document {
        doc! { "mentor_id": mentor_id, "mentee_id": mentee_id }
    }
}

impl Schema for Mentorship {
    const COLLECTION: &'static str = "mentorships";

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["mentor_id", "mentee_id"]),
            IndexSpec::ascending(&["mentee_id"]),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new(Self::COLLECTION);
        v.required("mentor_id", &self.mentor_id);
        v.required("mentee_id", &self.mentee_id);

        for (i, session) in self.sessions.iter().enumerate() {
            if session.scheduled_at <= 0 {
                v.error(format!("sessions.{}.scheduled_at", i), "is required");
            }
            v.range(
                &format!("sessions.{}.duration_minutes", i),
                session.duration_minutes,
                1,
                MAX_SESSION_MINUTES,
            );
        }

        for (i, entry) in self.progress.iter().enumerate() {
            v.required(&format!("progress.{}.milestone", i), &entry.milestone);
        }

        if let Some(feedback) = &self.feedback {
            if let Some(rating) = feedback.mentor_rating {
                v.range("feedback.mentor_rating", rating, 1, 5);
            }
            if let Some(rating) = feedback.mentee_rating {
                v.range("feedback.mentee_rating", rating, 1, 5);
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

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RequestMentorshipRequest {
    pub mentor_id: String,
    pub mentee_id: String,
    #[serde(default)]
    pub goals: Vec<String>,
}

impl From<RequestMentorshipRequest> for Mentorship {
    fn from(request: RequestMentorshipRequest) -> Self {
        Mentorship {
            id: None,
            mentor_id: request.mentor_id,
            mentee_id: request.mentee_id,
            status: MentorshipStatus::Requested,
            goals: request.goals,
            sessions: Vec::new(),
            progress: Vec::new(),
            feedback: None,
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateMentorshipStatusRequest {
    pub status: String,
}

impl UpdateMentorshipStatusRequest {
    pub fn parse(&self) -> Result<MentorshipStatus, ValidationError> {
        parse_enum(Mentorship::COLLECTION, "status", &self.status)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddSessionRequest {
    pub scheduled_at: i64,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddProgressRequest {
    pub milestone: String,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MentorshipQuery {
    pub mentor_id: Option<String>,
    pub mentee_id: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PairQuery {
    pub mentor_id: String,
    pub mentee_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MentorshipResponse {
    pub id: String,
    pub mentor_id: String,
    pub mentee_id: String,
    pub status: MentorshipStatus,
    pub goals: Vec<String>,
    pub sessions: Vec<Session>,
    pub progress: Vec<ProgressEntry>,
    pub feedback: Option<Feedback>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Mentorship> for MentorshipResponse {
    fn from(mentorship: Mentorship) -> Self {
        MentorshipResponse {
            id: mentorship.id.map(|id| id.to_hex()).unwrap_or_default(),
            mentor_id: mentorship.mentor_id,
            mentee_id: mentorship.mentee_id,
            status: mentorship.status,
            goals: mentorship.goals,
            sessions: mentorship.sessions,
            progress: mentorship.progress,
            feedback: mentorship.feedback,
            created_at: mentorship.created_at,
            updated_at: mentorship.updated_at,
        }
    }
}
