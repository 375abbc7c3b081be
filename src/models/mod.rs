pub mod extraction;
pub mod request;

pub use extraction::{DataCategory, ExtractionResult, SemesterRecord};
pub use request::{Credentials, SemesterSelection};
