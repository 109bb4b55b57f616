use futures::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::services::errors::api_service_errors::ApiServiceError;
use crate::services::review_service::ReviewService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    AlreadyReviewed,
    /// The check failed or never ran.
    Unknown,
}

/// Per (order, laptop) review eligibility, used to decide what to offer.
/// Entries are advisory; writes go through `submit`, which re-checks first.
pub struct ReviewEligibilityCache {
    reviews: Arc<ReviewService>,
    entries: RwLock<HashMap<(i64, i64), Eligibility>>,
}

impl ReviewEligibilityCache {
    pub fn new(reviews: Arc<ReviewService>) -> Self {
        ReviewEligibilityCache {
            reviews,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the cache with fresh answers for `pairs`, checked concurrently.
    pub async fn rebuild(&self, pairs: &[(i64, i64)]) {
        let checks = pairs.iter().map(|&(order_id, laptop_id)| async move {
            ((order_id, laptop_id), self.check(order_id, laptop_id).await)
        });
        let fresh: HashMap<_, _> = join_all(checks).await.into_iter().collect();
        debug!("Eligibility rebuilt for {} item(s)", fresh.len());
        *self.entries.write().await = fresh;
    }

    pub async fn get(&self, order_id: i64, laptop_id: i64) -> Eligibility {
        self.entries
            .read()
            .await
            .get(&(order_id, laptop_id))
            .copied()
            .unwrap_or(Eligibility::Unknown)
    }

    /// Asks the server again and records the answer.
    pub async fn confirm(&self, order_id: i64, laptop_id: i64) -> Eligibility {
        let eligibility = self.check(order_id, laptop_id).await;
        self.entries
            .write()
            .await
            .insert((order_id, laptop_id), eligibility);
        eligibility
    }

    /// Posts the review only if a fresh check says it is allowed.
    pub async fn submit(
        &self,
        order_id: i64,
        laptop_id: i64,
        rating: i64,
        comment: &str,
    ) -> Result<Value, ApiServiceError> {
        match self.confirm(order_id, laptop_id).await {
            Eligibility::Eligible => {}
            Eligibility::AlreadyReviewed => {
                return Err(ApiServiceError::rejected(
                    None,
                    "You've already reviewed this laptop for this order.",
                ))
            }
            Eligibility::Unknown => {
                return Err(ApiServiceError::rejected(
                    None,
                    "Unable to check review eligibility for this order",
                ))
            }
        }

        let created = self
            .reviews
            .create_review_for_order(order_id, laptop_id, rating, comment)
            .await?;
        self.entries
            .write()
            .await
            .insert((order_id, laptop_id), Eligibility::AlreadyReviewed);
        Ok(created)
    }

    async fn check(&self, order_id: i64, laptop_id: i64) -> Eligibility {
        if order_id <= 0 || laptop_id <= 0 {
            return Eligibility::Unknown;
        }
        match self
            .reviews
            .check_can_review_for_order(order_id, laptop_id)
            .await
        {
            Ok(answer) if answer.can_review => Eligibility::Eligible,
            Ok(_) => Eligibility::AlreadyReviewed,
            Err(e) => {
                warn!(
                    "Eligibility check for order {} laptop {} failed: {}",
                    order_id, laptop_id, e
                );
                Eligibility::Unknown
            }
        }
    }
}
