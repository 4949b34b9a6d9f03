use std::fmt;
use std::time::Duration;

/// What started a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// `POST /run`
    Http,
    /// `serve --every-secs`
    Interval(Duration),
    /// `quasar-sync run`
    Manual,
}

impl Trigger {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Http => "http",
            Trigger::Interval(_) => "interval",
            Trigger::Manual => "manual",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Interval(every) => write!(f, "interval({}s)", every.as_secs()),
            other => f.write_str(other.as_str()),
        }
    }
}
