pub mod error;
pub mod markup;
pub mod types;

pub use error::SkinMenuError;
pub use markup::*;
pub use types::*;
