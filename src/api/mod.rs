pub mod ai;
pub mod health;
pub mod hello;
pub mod mentorships;
pub mod profiles;
pub mod projects;
pub mod stories;
pub mod swagger;
pub mod users;

use actix_web::web;

/// Registers every route. `Database` and the completion client are expected
/// as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        .route("/api/hello", web::get().to(hello::hello))
        // ==================== USERS & PROFILES ====================
        .service(
            web::scope("/api/users")
                .route("", web::get().to(users::list_users))
                .route("", web::post().to(users::create_user))
                .route("/by-email", web::get().to(users::get_user_by_email)) // antes de /{id}
                .route("/{id}", web::get().to(users::get_user))
                .route("/{id}", web::put().to(users::update_user))
                .route("/{id}", web::delete().to(users::delete_user))
                .route("/{user_id}/career-profile", web::get().to(profiles::get_career_profile))
                .route("/{user_id}/career-profile", web::put().to(profiles::upsert_career_profile))
                .route("/{user_id}/career-profile", web::delete().to(profiles::delete_career_profile))
                .route("/{user_id}/profile", web::get().to(profiles::get_user_profile))
                .route("/{user_id}/profile", web::put().to(profiles::upsert_user_profile))
                .route("/{user_id}/profile", web::delete().to(profiles::delete_user_profile)),
        )
        // ==================== STORIES ====================
        .service(
            web::scope("/api/stories")
                .route("", web::get().to(stories::list_stories))
                .route("", web::post().to(stories::create_story))
                .route("/{id}", web::get().to(stories::get_story))
                .route("/{id}", web::put().to(stories::update_story))
                .route("/{id}", web::delete().to(stories::delete_story))
                .route("/{id}/comments", web::post().to(stories::add_comment))
                .route("/{id}/likes", web::post().to(stories::like_story)),
        )
        // ==================== PROJECTS ====================
        .service(
            web::scope("/api/projects")
                .route("", web::get().to(projects::list_projects))
                .route("", web::post().to(projects::create_project))
                .route("/{id}", web::get().to(projects::get_project))
                .route("/{id}", web::put().to(projects::update_project))
                .route("/{id}", web::delete().to(projects::delete_project))
                .route("/{id}/participants", web::post().to(projects::join_project))
                .route(
                    "/{id}/participants/{user_id}/approval",
                    web::put().to(projects::decide_approval),
                ),
        )
        // ==================== MENTORSHIPS ====================
        .service(
            web::scope("/api/mentorships")
                .route("", web::get().to(mentorships::list_mentorships))
                .route("", web::post().to(mentorships::request_mentorship))
                .route("/pair", web::get().to(mentorships::find_by_pair)) // antes de /{id}
                .route("/{id}", web::get().to(mentorships::get_mentorship))
                .route("/{id}", web::delete().to(mentorships::delete_mentorship))
                .route("/{id}/status", web::put().to(mentorships::update_status))
                .route("/{id}/sessions", web::post().to(mentorships::add_session))
                .route(
                    "/{id}/sessions/{index}/complete",
                    web::put().to(mentorships::complete_session),
                )
                .route("/{id}/progress", web::post().to(mentorships::add_progress))
                .route("/{id}/feedback", web::put().to(mentorships::set_feedback)),
        )
        // ==================== AI ====================
        .service(
            web::scope("/api/ai")
                .route("/career-paths", web::post().to(ai::career_paths))
                .route("/mentor-matches", web::post().to(ai::mentor_matches)),
        );
}
