//! Query embedding implementations.

mod http;
#[cfg(test)]
mod mock;

pub use http::HttpEmbedder;
#[cfg(test)]
pub use mock::MockEmbedder;
