use std::sync::Arc;

use crate::{
    domain::matching::{MatchError, MatchingService},
    routes::ApiError,
};

#[derive(Clone)]
pub struct AppState {
    matching: Arc<MatchingService>,
    debug: bool,
}

impl AppState {
    pub fn new(matching: MatchingService, debug: bool) -> Self {
        Self {
            matching: Arc::new(matching),
            debug,
        }
    }

    pub fn matching(&self) -> &MatchingService {
        &self.matching
    }

    /// Translate a matching failure, honouring the debug flag for internal detail.
    pub fn api_error(&self, err: MatchError) -> ApiError {
        ApiError::from_match(err, self.debug)
    }
}
