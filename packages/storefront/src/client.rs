use std::sync::Arc;
use tracing::info;

use crate::config::ClientConfig;
use crate::repositories::session_repository::{
    FileSessionRepository, InMemorySessionRepository, SessionRepository,
};
use crate::services::admin_service::AdminService;
use crate::services::auth_service::AuthService;
use crate::services::dispatcher::{
    HttpTransport, LogNavigator, Navigator, ReqwestTransport, RequestDispatcher,
};
use crate::services::errors::api_errors::TransportError;
use crate::services::laptop_service::LaptopService;
use crate::services::order_service::OrderService;
use crate::services::review_eligibility::ReviewEligibilityCache;
use crate::services::review_service::ReviewService;
use crate::services::session_service::SessionStore;

/// Every service wired around one session store and one dispatcher.
#[derive(Clone)]
pub struct StorefrontClient {
    pub session: Arc<SessionStore>,
    pub dispatcher: Arc<RequestDispatcher>,
    pub auth: Arc<AuthService>,
    pub laptops: Arc<LaptopService>,
    pub orders: Arc<OrderService>,
    pub admin: Arc<AdminService>,
    pub reviews: Arc<ReviewService>,
    pub eligibility: Arc<ReviewEligibilityCache>,
}

impl StorefrontClient {
    /// Builds the reqwest transport and the configured session backend, then
    /// sweeps the stored session.
    pub async fn connect(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        let repository: Arc<dyn SessionRepository> = match &config.session_file {
            Some(path) => {
                info!("Using session file {}", path.display());
                Arc::new(FileSessionRepository::new(path.clone()))
            }
            None => Arc::new(InMemorySessionRepository::new()),
        };
        Ok(Self::from_parts(config, transport, repository, Arc::new(LogNavigator)).await)
    }

    pub async fn from_parts(
        config: &ClientConfig,
        transport: Arc<dyn HttpTransport>,
        repository: Arc<dyn SessionRepository>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = Arc::new(SessionStore::init(repository).await);
        let dispatcher = Arc::new(
            RequestDispatcher::new(transport, session.clone(), navigator)
                .with_landing_path(config.landing_path.clone()),
        );
        let reviews = Arc::new(ReviewService::new(dispatcher.clone()));

        StorefrontClient {
            auth: Arc::new(AuthService::new(dispatcher.clone())),
            laptops: Arc::new(LaptopService::new(dispatcher.clone())),
            orders: Arc::new(OrderService::new(dispatcher.clone())),
            admin: Arc::new(AdminService::new(dispatcher.clone())),
            eligibility: Arc::new(ReviewEligibilityCache::new(reviews.clone())),
            reviews,
            session,
            dispatcher,
        }
    }
}
