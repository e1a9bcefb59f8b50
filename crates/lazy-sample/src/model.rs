//! Parsed input for one run.

use lazy_arbiter::{ArbiterConfig, Request};
use serde::{Deserialize, Serialize};

/// Everything read from the input stream: the run configuration and the requests
/// in the order they were listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub config: ArbiterConfig,
    pub requests: Vec<Request>,
}

impl Workload {
    pub fn new(config: ArbiterConfig, requests: Vec<Request>) -> Self {
        Self { config, requests }
    }
}
