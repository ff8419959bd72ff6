use serde::{Deserialize, Serialize};
use validator::Validate;

/// A swipe submission received over the real-time channel
///
/// The swiping user is implicit from the authenticated connection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwipeSubmission {
    #[validate(length(min = 1))]
    pub recipe_id: String,
    pub liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_submission_rejects_empty_recipe_id() {
        let submission = SwipeSubmission {
            recipe_id: String::new(),
            liked: true,
        };
        assert!(submission.validate().is_err());
    }

    #[test]
    fn test_swipe_submission_accepts_valid() {
        let submission = SwipeSubmission {
            recipe_id: "r1".to_string(),
            liked: false,
        };
        assert!(submission.validate().is_ok());
    }
}
