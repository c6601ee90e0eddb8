pub mod command;
pub mod surface;
pub mod svg;

pub use command::*;
pub use surface::*;
pub use svg::*;
