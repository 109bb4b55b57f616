use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub laptop_id: i64,
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReviewUpdate {
    #[serde(rename = "reviewID")]
    pub review_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanReviewResponse {
    pub can_review: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl CanReviewResponse {
    pub fn denied(reason: &str) -> Self {
        CanReviewResponse {
            can_review: false,
            reason: Some(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_review_update_skips_unset_fields() {
        let update = ReviewUpdate {
            review_id: 12,
            rating: Some(4),
            comment: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "reviewID": 12, "rating": 4 })
        );
    }

    #[test]
    fn test_can_review_response_without_reason() {
        let response: CanReviewResponse =
            serde_json::from_value(json!({ "canReview": true })).unwrap();
        assert!(response.can_review);
        assert!(response.reason.is_none());
    }
}
