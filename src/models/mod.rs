// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    MatchNotification, MatchRecord, MatchResolution, RecipeSummary, SwipeOutcome, UserProfile,
};
pub use requests::SwipeSubmission;
pub use responses::{ErrorResponse, HealthResponse, PresenceResponse};
