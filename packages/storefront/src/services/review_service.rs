use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::http::ApiRequest;
use crate::models::review::{CanReviewResponse, ReviewRequest, ReviewUpdate};
use crate::models::user::UserId;
use crate::services::api_support::{send, send_with, StatusOverrides, Wording};
use crate::services::dispatcher::RequestDispatcher;
use crate::services::errors::api_service_errors::ApiServiceError;

pub const MIN_COMMENT_LENGTH: usize = 5;

const CREATE_ERRORS: &StatusOverrides = &[
    (
        400,
        Wording::Validation("Check laptop ID, rating (1-5), and comment (min 5 chars)."),
    ),
    (401, Wording::Fixed("Please login to write a review.")),
    (403, Wording::Fixed("You can only review laptops after delivery.")),
    (404, Wording::Fixed("Laptop not found.")),
    (409, Wording::Fixed("You've already reviewed this product.")),
];

const CREATE_FOR_ORDER_ERRORS: &StatusOverrides = &[
    (
        400,
        Wording::Validation("Check order ID, laptop ID, rating (1-5), and comment (min 5 chars)."),
    ),
    (401, Wording::Fixed("Please login to write a review.")),
    (
        403,
        Wording::Fixed("You can only review laptops from your delivered orders."),
    ),
    (404, Wording::Fixed("Order or laptop not found.")),
    (409, Wording::Fixed("You've already reviewed this laptop for this order.")),
];

const UPDATE_ERRORS: &StatusOverrides = &[
    (
        400,
        Wording::Remote("Validation error: rating 1-5 and comment min 10 characters."),
    ),
    (401, Wording::Fixed("Please login to edit your review.")),
    (403, Wording::Fixed("You can only edit your own review.")),
    (404, Wording::Fixed("Review not found.")),
];

const DELETE_ERRORS: &StatusOverrides = &[
    (401, Wording::Fixed("Please login to delete your review.")),
    (403, Wording::Fixed("You can only delete your own review.")),
    (404, Wording::Fixed("Review not found.")),
];

pub struct ReviewService {
    dispatcher: Arc<RequestDispatcher>,
}

impl ReviewService {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        ReviewService { dispatcher }
    }

    pub async fn create_review(
        &self,
        laptop_id: i64,
        rating: i64,
        comment: &str,
    ) -> Result<Value, ApiServiceError> {
        let review = validate_review(laptop_id, rating, comment)?;
        let response = send_with(
            &self.dispatcher,
            ApiRequest::post("/reviews").json(json!(review)),
            CREATE_ERRORS,
        )
        .await?;
        info!("Review posted for laptop {}", laptop_id);
        Ok(response.json_value())
    }

    pub async fn create_review_for_order(
        &self,
        order_id: i64,
        laptop_id: i64,
        rating: i64,
        comment: &str,
    ) -> Result<Value, ApiServiceError> {
        if order_id <= 0 {
            return Err(ApiServiceError::Validation(
                "Invalid order ID. Must be a positive integer.".to_string(),
            ));
        }
        let review = validate_review(laptop_id, rating, comment)?;
        let response = send_with(
            &self.dispatcher,
            ApiRequest::post(format!("/reviews/order/{}", order_id)).json(json!(review)),
            CREATE_FOR_ORDER_ERRORS,
        )
        .await?;
        info!("Review posted for laptop {} in order {}", laptop_id, order_id);
        Ok(response.json_value())
    }

    /// Reviews of one laptop. Falls back to filtering the full listing when
    /// the per-laptop endpoint fails.
    pub async fn laptop_reviews(&self, laptop_id: i64) -> Result<Value, ApiServiceError> {
        let first = match self
            .dispatcher
            .dispatch(ApiRequest::get(format!("/reviews/laptop/{}", laptop_id)))
            .await
        {
            Ok(response) => return Ok(response.json_value()),
            Err(error) => error,
        };

        debug!("Per-laptop reviews failed ({}), filtering all reviews", first);
        match self.dispatcher.dispatch(ApiRequest::get("/reviews")).await {
            Ok(response) => Ok(Value::Array(reviews_for_laptop(response.json_value(), laptop_id))),
            Err(_) => Err(self.dispatcher.handle_api_error(&first).await.into()),
        }
    }

    pub async fn update_review(
        &self,
        review_id: i64,
        rating: Option<i64>,
        comment: Option<&str>,
    ) -> Result<Value, ApiServiceError> {
        let rating = rating.map(checked_rating).transpose()?;
        let update = ReviewUpdate {
            review_id,
            rating,
            comment: comment.map(str::to_string),
        };
        let response = send_with(
            &self.dispatcher,
            ApiRequest::put("/reviews").json(json!(update)),
            UPDATE_ERRORS,
        )
        .await?;
        Ok(response.json_value())
    }

    pub async fn delete_review(&self, review_id: i64) -> Result<Value, ApiServiceError> {
        let response = send_with(
            &self.dispatcher,
            ApiRequest::delete(format!("/reviews/{}", review_id)),
            DELETE_ERRORS,
        )
        .await?;
        info!("Deleted review {}", review_id);
        Ok(response.json_value())
    }

    /// The caller's reviews. The backend has exposed this under several
    /// paths; the first that answers wins, and none answering is an empty list.
    pub async fn my_reviews(&self, user_id: Option<UserId>) -> Value {
        let user_id = match user_id {
            Some(id) => Some(id),
            None => self
                .dispatcher
                .session()
                .user_profile()
                .await
                .and_then(|profile| profile.id),
        };

        let mut paths = vec!["/reviews/my".to_string(), "/reviews/my-reviews".to_string()];
        if let Some(id) = user_id {
            paths.push(format!("/reviews/user/{}", id));
        }

        for path in paths {
            match self.dispatcher.dispatch(ApiRequest::get(path.as_str())).await {
                Ok(response) => return response.json_value(),
                Err(error) => debug!("{} unavailable: {}", path, error),
            }
        }
        warn!("No review listing endpoint answered, returning none");
        Value::Array(Vec::new())
    }

    /// Raw eligibility check for one laptop; failures are returned as errors.
    pub async fn check_can_review(
        &self,
        laptop_id: i64,
    ) -> Result<CanReviewResponse, ApiServiceError> {
        if laptop_id <= 0 {
            return Ok(CanReviewResponse::denied("Invalid laptop ID"));
        }
        let response = send(
            &self.dispatcher,
            ApiRequest::get(format!("/reviews/can-review/{}", laptop_id)),
        )
        .await?;
        parse_eligibility(response.json_value())
    }

    /// Raw eligibility check for one laptop within one order.
    pub async fn check_can_review_for_order(
        &self,
        order_id: i64,
        laptop_id: i64,
    ) -> Result<CanReviewResponse, ApiServiceError> {
        if order_id <= 0 || laptop_id <= 0 {
            return Ok(CanReviewResponse::denied("Invalid order or laptop ID"));
        }
        let response = send(
            &self.dispatcher,
            ApiRequest::get(format!("/reviews/can-review/order/{}/laptop/{}", order_id, laptop_id)),
        )
        .await?;
        parse_eligibility(response.json_value())
    }

    /// Never fails: any error becomes a denial with a reason.
    pub async fn can_review(&self, laptop_id: i64) -> CanReviewResponse {
        self.check_can_review(laptop_id).await.unwrap_or_else(|e| {
            warn!("Review eligibility check failed: {}", e);
            CanReviewResponse::denied("Unable to check review eligibility")
        })
    }

    pub async fn can_review_for_order(&self, order_id: i64, laptop_id: i64) -> CanReviewResponse {
        self.check_can_review_for_order(order_id, laptop_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Review eligibility check failed: {}", e);
                CanReviewResponse::denied("Unable to check review eligibility for this order")
            })
    }
}

/// Checks a new review before it is sent.
pub fn validate_review(
    laptop_id: i64,
    rating: i64,
    comment: &str,
) -> Result<ReviewRequest, ApiServiceError> {
    if laptop_id <= 0 {
        return Err(ApiServiceError::Validation(
            "Invalid laptop ID. Must be a positive integer.".to_string(),
        ));
    }
    let rating = checked_rating(rating)?;
    let comment = comment.trim();
    if comment.chars().count() < MIN_COMMENT_LENGTH {
        return Err(ApiServiceError::Validation(format!(
            "Comment must be at least {} characters long.",
            MIN_COMMENT_LENGTH
        )));
    }
    Ok(ReviewRequest {
        laptop_id,
        rating,
        comment: comment.to_string(),
    })
}

fn checked_rating(rating: i64) -> Result<u8, ApiServiceError> {
    match u8::try_from(rating) {
        Ok(rating @ 1..=5) => Ok(rating),
        _ => Err(ApiServiceError::Validation(
            "Rating must be between 1 and 5.".to_string(),
        )),
    }
}

fn parse_eligibility(body: Value) -> Result<CanReviewResponse, ApiServiceError> {
    serde_json::from_value(body).map_err(|e| {
        ApiServiceError::rejected(None, format!("Unreadable eligibility response: {}", e))
    })
}

fn reviews_for_laptop(all: Value, laptop_id: i64) -> Vec<Value> {
    match all {
        Value::Array(reviews) => reviews
            .into_iter()
            .filter(|review| {
                review
                    .get("laptop")
                    .and_then(|laptop| laptop.get("laptopID"))
                    .and_then(Value::as_i64)
                    == Some(laptop_id)
            })
            .collect(),
        _ => Vec::new(),
    }
}
