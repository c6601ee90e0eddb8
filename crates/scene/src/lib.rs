pub mod dataset;
pub mod marker;
pub mod marker_set;
pub mod view_state;
pub mod visibility;

pub use dataset::*;
pub use marker::*;
pub use marker_set::*;
pub use view_state::*;
pub use visibility::*;
