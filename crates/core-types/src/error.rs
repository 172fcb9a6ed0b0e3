use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A field holds a value no operation can work with, e.g. a zero-day window.
    #[error("Invalid value for {0}: {1}")]
    InvalidInput(String, String),
}
