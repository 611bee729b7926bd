/// Business logic layer for discussion-service
pub mod discussion;

pub use discussion::{DiscussionService, STANDALONE_POST_ASSET_ID};
