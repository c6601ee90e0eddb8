pub mod event_bus;
pub mod transition;

pub use event_bus::*;
pub use transition::*;
