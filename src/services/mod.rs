pub mod ai_service;
pub mod mentorship_service;
pub mod profile_service;
pub mod project_service;
pub mod story_service;
pub mod user_service;
