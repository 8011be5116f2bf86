// Core moderation module - contains the content filter business logic.

pub mod content_classifier;
pub mod group_aggregator;
pub mod moderation_models;
pub mod moderation_service;
pub mod transport;
pub mod word_list_service;
pub mod word_matcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use content_classifier::*;
pub use group_aggregator::*;
pub use moderation_models::*;
pub use moderation_service::*;
pub use transport::*;
pub use word_list_service::*;
pub use word_matcher::*;
