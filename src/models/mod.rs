pub mod schema;
pub mod user;
pub mod career_profile;
pub mod user_profile;
pub mod story;
pub mod project;
pub mod mentorship;

pub use schema::*;
pub use user::*;
pub use career_profile::*;
pub use user_profile::*;
pub use story::*;
pub use project::*;
pub use mentorship::*;
