use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Career Canvas API",
        version = "1.0.0",
        description = "API for the Career Canvas Teams app.\n\n**Features:**\n- Users with career and personal profiles\n- Career stories with comments and likes\n- Internal projects with manager approval\n- Mentorships with sessions, progress and feedback\n- AI career path suggestions and mentor matching"
    ),
    paths(
        // General
        crate::api::hello::hello,
        crate::api::health::health_check,

        // Users
        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::get_user_by_email,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        // Profiles
        crate::api::profiles::get_career_profile,
        crate::api::profiles::upsert_career_profile,
        crate::api::profiles::delete_career_profile,
        crate::api::profiles::get_user_profile,
        crate::api::profiles::upsert_user_profile,
        crate::api::profiles::delete_user_profile,

        // Stories
        crate::api::stories::list_stories,
        crate::api::stories::create_story,
        crate::api::stories::get_story,
        crate::api::stories::update_story,
        crate::api::stories::delete_story,
        crate::api::stories::add_comment,
        crate::api::stories::like_story,

        // Projects
        crate::api::projects::list_projects,
        crate::api::projects::create_project,
        crate::api::projects::get_project,
        crate::api::projects::update_project,
        crate::api::projects::delete_project,
        crate::api::projects::join_project,
        crate::api::projects::decide_approval,

        // Mentorships
        crate::api::mentorships::list_mentorships,
        crate::api::mentorships::request_mentorship,
        crate::api::mentorships::find_by_pair,
        crate::api::mentorships::get_mentorship,
        crate::api::mentorships::delete_mentorship,
        crate::api::mentorships::update_status,
        crate::api::mentorships::add_session,
        crate::api::mentorships::complete_session,
        crate::api::mentorships::add_progress,
        crate::api::mentorships::set_feedback,

        // AI
        crate::api::ai::career_paths,
        crate::api::ai::mentor_matches,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::database::QueryPlan,

            // Users & profiles
            crate::models::UserPreferences,
            crate::models::CreateUserRequest,
            crate::models::UpdateUserRequest,
            crate::models::UserResponse,
            crate::models::Experience,
            crate::models::Education,
            crate::models::Certification,
            crate::models::UpsertCareerProfileRequest,
            crate::models::CareerProfileResponse,
            crate::models::UpsertUserProfileRequest,
            crate::models::UserProfileResponse,

            // Stories
            crate::models::CareerStage,
            crate::models::Visibility,
            crate::models::Comment,
            crate::models::CreateStoryRequest,
            crate::models::UpdateStoryRequest,
            crate::models::AddCommentRequest,
            crate::models::LikeStoryRequest,
            crate::models::StoryResponse,

            // Projects
            crate::models::ProjectStatus,
            crate::models::ApprovalStatus,
            crate::models::ManagerApproval,
            crate::models::Participant,
            crate::models::CreateProjectRequest,
            crate::models::UpdateProjectRequest,
            crate::models::JoinProjectRequest,
            crate::models::ApprovalDecisionRequest,
            crate::models::ProjectResponse,

            // Mentorships
            crate::models::MentorshipStatus,
            crate::models::Session,
            crate::models::ProgressEntry,
            crate::models::Feedback,
            crate::models::RequestMentorshipRequest,
            crate::models::UpdateMentorshipStatusRequest,
            crate::models::AddSessionRequest,
            crate::models::AddProgressRequest,
            crate::models::MentorshipResponse,

            // AI
            crate::services::ai_service::CareerPathsRequest,
            crate::services::ai_service::MentorMatchesRequest,
        )
    ),
    tags(
        (name = "General", description = "Greeting endpoint used by the Teams tab."),
        (name = "Health", description = "Service and document store status."),
        (name = "Users", description = "User accounts. Email and Microsoft id are unique."),
        (name = "Profiles", description = "Career and personal profiles, one of each per user."),
        (name = "Stories", description = "Career stories with comments and likes."),
        (name = "Projects", description = "Internal projects and manager approval of participants."),
        (name = "Mentorships", description = "Mentor/mentee pairs with sessions, progress and feedback."),
        (name = "AI", description = "Completion-backed career path suggestions and mentor matching."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/hello",
            "/api/users/by-email",
            "/api/users/{user_id}/career-profile",
            "/api/projects/{id}/participants/{user_id}/approval",
            "/api/mentorships/{id}/sessions/{index}/complete",
            "/api/ai/mentor-matches",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
