//! JSON envelopes for the read-only listing API.

use crate::models::{Advertisement, Statistics};
use crate::run_guard::RunStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    pub country: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub success: bool,
    pub count: usize,
    pub listings: Vec<Advertisement>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: Statistics,
}

#[derive(Debug, Serialize)]
pub struct SchedulerResponse {
    pub success: bool,
    pub scheduler: RunStatus,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
