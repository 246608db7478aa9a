pub mod client;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use client::*;
pub use prompts::*;
