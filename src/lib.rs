pub mod canvas;
pub mod mosaic;

pub use canvas::Canvas;
pub use mosaic::*;
