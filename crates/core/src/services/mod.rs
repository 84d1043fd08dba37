//! Business logic services.

pub mod votable;
pub mod voter;

pub use votable::{VotableService, VoteTally};
pub use voter::VoterService;
