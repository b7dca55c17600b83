pub mod generate;
pub mod graph;
pub mod steps;
pub mod util;

pub use generate::*;
pub use graph::*;
pub use steps::*;
pub use util::*;
