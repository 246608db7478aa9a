pub mod clean;
pub mod validation;

pub use clean::*;
pub use validation::*;
