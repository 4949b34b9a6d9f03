pub mod interval;
pub mod trigger;

pub use trigger::Trigger;
