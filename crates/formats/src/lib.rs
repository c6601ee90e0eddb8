pub mod geometry;
pub mod manifest;
pub mod map_data;
pub mod metric_table;
pub mod topology;
pub mod variant;

pub use geometry::*;
pub use manifest::*;
pub use map_data::*;
pub use metric_table::*;
pub use topology::*;
pub use variant::*;
