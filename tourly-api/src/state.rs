use std::sync::Arc;
use std::time::Duration;

use tourly_booking::{BookingManager, TourCatalog};
use tourly_core::IdentityService;
use tourly_store::{Repositories, RedisClient};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingManager>,
    pub catalog: Arc<TourCatalog>,
    pub identity: Arc<IdentityService>,
    pub auth: AuthConfig,
    pub request_timeout: Duration,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimit>,
}

impl AppState {
    pub fn new(repos: Repositories, auth: AuthConfig, bcrypt_cost: u32) -> Self {
        Self {
            bookings: Arc::new(BookingManager::new(
                repos.tours.clone(),
                repos.bookings,
                repos.users.clone(),
            )),
            catalog: Arc::new(TourCatalog::new(repos.tours)),
            identity: Arc::new(IdentityService::new(repos.users, bcrypt_cost)),
            auth,
            request_timeout: Duration::from_secs(30),
            rate_limit: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, redis: RedisClient, per_minute: i64) -> Self {
        self.rate_limit = Some(RateLimit {
            redis: Arc::new(redis),
            per_minute,
        });
        self
    }
}
