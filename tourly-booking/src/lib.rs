pub mod catalog;
pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

pub use catalog::TourCatalog;
pub use manager::{BookingError, BookingManager, StatusTransition};
pub use memory::MemoryStore;
pub use models::{Booking, BookingRequest, BookingStatus, BookingView};
pub use repository::BookingRepository;
