pub mod dispatch;
pub mod queue;

pub use dispatch::*;
pub use queue::*;
