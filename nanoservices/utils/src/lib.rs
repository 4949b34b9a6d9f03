pub mod error;

use error::Error;

pub type QuasarResult<T> = Result<T, Error>;
