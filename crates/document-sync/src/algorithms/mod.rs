//! # Algorithms Module
//!
//! Tag mapping, confirmation polling, query building and pagination.

pub mod confirmation;
pub mod pagination;
pub mod query_builder;
pub mod tag_codec;

pub use confirmation::{ConfirmationPoller, PollOutcome, PollState};
pub use pagination::{paginate, sort_by_version_desc, ResultOrdering};
pub use query_builder::{build_index_query, DocumentQuery};
pub use tag_codec::{
    decode_user_tags, encode_tags, parse_system_tags, user_tag_name, version_of, SystemTags,
};
