pub mod error;
pub mod extractor;
pub mod reader;
pub mod resolve;
pub mod select;

pub mod test_support;

pub use error::ExtractError;
pub use extractor::Extractor;
pub use reader::{LopdfReader, PageReader};
