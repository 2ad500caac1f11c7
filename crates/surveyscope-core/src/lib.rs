pub mod choice;
pub mod model;
pub mod range;
pub mod scoring;

pub use choice::*;
pub use model::*;
pub use range::*;
pub use scoring::*;
