//! The activity model and everything computed from it: normalization of raw records, merging
//! into the persisted set, and the summary published to the website.

pub mod entities;
pub mod merge;
pub mod normalize;
pub mod summary;

pub use entities::{Activity, ActivitySet, Signature};
pub use merge::{merge, MergeReport};
pub use normalize::{Normalized, Normalizer, Rejection};
pub use summary::{Aggregator, Summary};
