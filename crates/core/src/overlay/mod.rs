pub mod canvas;
pub mod renderer;

pub use canvas::*;
pub use renderer::*;
