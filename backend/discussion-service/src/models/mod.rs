/// Data models for discussion-service
///
/// - `discourse`: payloads exchanged with the Discourse REST API
/// - `api`: request bodies and UI responses
/// - `user`: the authenticated platform user
pub mod api;
pub mod discourse;
pub mod user;

pub use api::*;
pub use discourse::{DiscourseCategory, DiscoursePost, DiscourseTopic};
pub use user::PlatformUser;
