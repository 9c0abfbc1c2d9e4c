use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::schema::{
    parse_enum, string_enum, IndexSpec, Schema, ValidationError, Validator,
};

string_enum! {
    pub enum ProjectStatus {
        Open => "open",
        InProgress => "in-progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

string_enum! {
    pub enum ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// Aprovação do gestor para a participação no projeto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ManagerApproval {
    pub status: ApprovalStatus,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub decided_at: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Default for ManagerApproval {
    fn default() -> Self {
        Self {
            status: ApprovalStatus::Pending,
            manager_id: None,
            decided_at: None,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Participant {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
    pub joined_at: i64,
    #[serde(default)]
    pub manager_approval: ManagerApproval,
}

/// Projeto interno (armazenado no MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub creator_id: String,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub required_skills: Vec<String>,

    pub status: ProjectStatus,

    #[serde(default)]
    pub participants: Vec<Participant>,

    /// YYYY-MM-DD
    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl Project {
    pub fn participant_index(&self, user_id: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.user_id == user_id)
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }
}

impl Schema for Project {
    const COLLECTION: &'static str = "projects";

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["creator_id"]),
            IndexSpec::ascending(&["status"]),
            IndexSpec::text("project_text", &["title", "description", "required_skills"]),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new(Self::COLLECTION);
        v.required("creator_id", &self.creator_id);
        v.required("title", &self.title);
        v.required("description", &self.description);
        v.optional_date("start_date", self.start_date.as_deref());
        v.optional_date("end_date", self.end_date.as_deref());
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            if end < start {
                v.error("end_date", "must not be before start_date");
            }
        }
        for (i, participant) in self.participants.iter().enumerate() {
            v.required(&format!("participants.{}.user_id", i), &participant.user_id);
            // Uma decisão sempre registra quem decidiu
            let approval = &participant.manager_approval;
            if approval.status != ApprovalStatus::Pending {
                v.required(
                    &format!("participants.{}.manager_approval.manager_id", i),
                    approval.manager_id.as_deref().unwrap_or(""),
                );
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
pub struct CreateProjectRequest {
    pub creator_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TryFrom<CreateProjectRequest> for Project {
    type Error = ValidationError;

    fn try_from(request: CreateProjectRequest) -> Result<Self, Self::Error> {
        let status = match request.status.as_deref() {
            Some(value) => parse_enum(Project::COLLECTION, "status", value)?,
            None => ProjectStatus::Open,
        };

        Ok(Project {
            id: None,
            creator_id: request.creator_id,
            title: request.title.trim().to_string(),
            description: request.description,
            required_skills: request.required_skills,
            status,
            participants: Vec::new(),
            start_date: request.start_date,
            end_date: request.end_date,
            created_at: 0,
            updated_at: 0,
        })
    }
}

/// Status pode ir para qualquer valor do enum; transições não são validadas
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl UpdateProjectRequest {
    pub fn apply(self, project: &mut Project) -> Result<(), ValidationError> {
        if let Some(status) = &self.status {
            project.status = parse_enum(Project::COLLECTION, "status", status)?;
        }
        if let Some(title) = self.title {
            project.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(skills) = self.required_skills {
            project.required_skills = skills;
        }
        if let Some(start) = self.start_date {
            project.start_date = Some(start);
        }
        if let Some(end) = self.end_date {
            project.end_date = Some(end);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct JoinProjectRequest {
    pub user_id: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ApprovalDecisionRequest {
    /// "approved" ou "rejected"
    pub status: String,
    pub manager_id: String,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectQuery {
    pub status: Option<String>,
    pub creator_id: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub status: ProjectStatus,
    pub participants: Vec<Participant>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
            creator_id: project.creator_id,
            title: project.title,
            description: project.description,
            required_skills: project.required_skills,
            status: project.status,
            participants: project.participants,
            start_date: project.start_date,
            end_date: project.end_date,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}
