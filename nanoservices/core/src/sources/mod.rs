pub mod postgres;
pub mod row;
pub mod traits;

pub use traits::SourceReader;
