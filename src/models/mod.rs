pub mod artifact;
pub mod language;
pub mod request;
pub mod response;

pub use artifact::*;
pub use language::*;
pub use request::*;
pub use response::*;
