pub(crate) mod error;
pub(crate) mod matching;
mod validation;

pub(crate) use error::ApiError;
