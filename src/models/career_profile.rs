use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::schema::{IndexSpec, Schema, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Experience {
    pub title: String,
    pub company: String,
    /// YYYY-MM-DD
    pub start_date: String,
    /// None while the position is current
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Education {
    pub institution: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    #[serde(default)]
    pub issued_on: Option<String>,
    #[serde(default)]
    pub expires_on: Option<String>,
}

/// Perfil de carreira: um por usuário
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,

    #[serde(default)]
    pub current_role: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub interests: Vec<String>,

    #[serde(default)]
    pub experience: Vec<Experience>,

    #[serde(default)]
    pub education: Vec<Education>,

    #[serde(default)]
    pub certifications: Vec<Certification>,

    pub created_at: i64,
    pub updated_at: i64,
}

impl CareerProfile {
    pub fn new(user_id: &str) -> Self {
        CareerProfile {
            id: None,
            user_id: user_id.to_string(),
            current_role: None,
            skills: Vec::new(),
            interests: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            certifications: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Schema for CareerProfile {
    const COLLECTION: &'static str = "career_profiles";

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::ascending(&["user_id"]).unique(),
            IndexSpec::text("career_profile_text", &["current_role", "skills", "interests"]),
        ]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new(Self::COLLECTION);
        v.required("user_id", &self.user_id);

        for (i, skill) in self.skills.iter().enumerate() {
            v.required(&format!("skills.{}", i), skill);
        }

        for (i, exp) in self.experience.iter().enumerate() {
            let path = format!("experience.{}", i);
            v.required(&format!("{}.title", path), &exp.title);
            v.required(&format!("{}.company", path), &exp.company);
            v.date(&format!("{}.start_date", path), &exp.start_date);
            v.optional_date(&format!("{}.end_date", path), exp.end_date.as_deref());
            // Dates are ISO formatted, so lexical order is chronological.
            if let Some(end) = &exp.end_date {
                if end.as_str() < exp.start_date.as_str() {
                    v.error(format!("{}.end_date", path), "must not be before start_date");
                }
            }
        }

        for (i, edu) in self.education.iter().enumerate() {
            let path = format!("education.{}", i);
            v.required(&format!("{}.institution", path), &edu.institution);
            if let Some(year) = edu.graduation_year {
                v.range(&format!("{}.graduation_year", path), year as i64, 1900, 2100);
            }
        }

        for (i, cert) in self.certifications.iter().enumerate() {
            let path = format!("certifications.{}", i);
            v.required(&format!("{}.name", path), &cert.name);
            v.required(&format!("{}.issuer", path), &cert.issuer);
            v.optional_date(&format!("{}.issued_on", path), cert.issued_on.as_deref());
            v.optional_date(&format!("{}.expires_on", path), cert.expires_on.as_deref());
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

/// Request de upsert: campos ausentes mantêm o valor atual
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpsertCareerProfileRequest {
    pub current_role: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub experience: Option<Vec<Experience>>,
    pub education: Option<Vec<Education>>,
    pub certifications: Option<Vec<Certification>>,
}

impl UpsertCareerProfileRequest {
    pub fn apply(self, profile: &mut CareerProfile) -> Vec<&'static str> {
        let mut touched = Vec::new();
        if let Some(role) = self.current_role {
            profile.current_role = Some(role);
            touched.push("current_role");
        }
        if let Some(skills) = self.skills {
            profile.skills = skills.into_iter().map(|s| s.trim().to_string()).collect();
            touched.push("skills");
        }
        if let Some(interests) = self.interests {
            profile.interests = interests;
            touched.push("interests");
        }
        if let Some(experience) = self.experience {
            profile.experience = experience;
            touched.push("experience");
        }
        if let Some(education) = self.education {
            profile.education = education;
            touched.push("education");
        }
        if let Some(certifications) = self.certifications {
            profile.certifications = certifications;
            touched.push("certifications");
        }
        touched
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CareerProfileResponse {
    pub id: String,
    pub user_id: String,
    pub current_role: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<CareerProfile> for CareerProfileResponse {
    fn from(profile: CareerProfile) -> Self {
        CareerProfileResponse {
            id: profile.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: profile.user_id,
            current_role: profile.current_role,
            skills: profile.skills,
            interests: profile.interests,
            experience: profile.experience,
            education: profile.education,
            certifications: profile.certifications,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}
