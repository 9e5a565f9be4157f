pub mod error;
pub mod portfolio;
pub mod types;

pub use error::*;
pub use portfolio::Portfolio;
pub use types::*;
