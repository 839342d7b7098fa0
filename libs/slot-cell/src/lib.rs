pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the pieces other cells consume
pub use models::{OpenSlotView, Slot, SlotError};
pub use services::slot::SlotService;
