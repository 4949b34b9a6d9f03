pub mod postgres;
pub mod traits;

pub use traits::NavAidSink;
