// libs/consultation-cell/src/lib.rs
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the pieces other cells consume
pub use models::{Consultation, ConsultationError, ConsultationStatus};
pub use services::booking::ConsultationBookingService;
pub use services::decision::ConsultationDecisionService;
