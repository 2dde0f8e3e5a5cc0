pub mod definition;
pub mod topology;

pub use definition::*;
