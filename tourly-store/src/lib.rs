pub mod app_config;
pub mod backend;
pub mod booking_repo;
pub mod database;
pub mod redis_repo;
pub mod tour_repo;
pub mod user_repo;

pub use backend::Repositories;
pub use database::DbClient;
pub use redis_repo::RedisClient;
