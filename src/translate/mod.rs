pub mod interface;
pub mod prompt;
pub mod gateway;

pub use interface::*;
pub use gateway::{Translation, TranslationGateway};
