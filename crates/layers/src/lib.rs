pub mod basemap;
pub mod hover;
pub mod layer;
pub mod legend;
pub mod map_view;
pub mod markers;
pub mod symbology;
pub mod trend;

pub use layer::*;
pub use map_view::*;
