//! Data backend: the capability that dispatch actions call into.
//!
//! `DataProvider` is the seam; `DemoDataProvider` serves fixed figures until a real backend is wired in.

mod demo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use demo::DemoDataProvider;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend timed out after {0}s")]
    Timeout(u64),
}

/// Call figures for today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCallReport {
    pub total_calls: u32,
    pub successful_calls: u32,
    pub failed_calls: u32,
    pub avg_duration: String,
}

/// One day in the weekly breakdown (`date` as dd/mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub calls: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCallReport {
    pub total_calls: u32,
    pub successful_calls: u32,
    pub failed_calls: u32,
    pub daily_breakdown: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCallReport {
    pub total_calls: u32,
    pub growth_rate: String,
    pub busiest_hour: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub overall_status: String,
    pub uptime: String,
    pub last_restart: String,
    pub active_lines: u32,
    pub queue_length: u32,
}

/// Configured phone lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneLines {
    pub configured_numbers: Vec<String>,
    pub total_lines: u32,
    pub active_lines: u32,
    pub last_config_change: String,
}

/// Outcome of configuring one number. `error_code` is set on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneConfigResult {
    pub success: bool,
    pub phone: String,
    pub status: String,
    pub configured_at: String,
    pub message: String,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: String,
    pub status: String,
    pub customer: String,
    pub total: String,
    pub updated_at: String,
}

/// Backend actions, one per intent that needs data.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn daily_call_report(&self) -> Result<DailyCallReport, ProviderError>;
    async fn weekly_call_report(&self) -> Result<WeeklyCallReport, ProviderError>;
    async fn monthly_call_report(&self) -> Result<MonthlyCallReport, ProviderError>;
    async fn system_status(&self) -> Result<SystemStatus, ProviderError>;
    async fn phone_lines(&self) -> Result<PhoneLines, ProviderError>;
    async fn configure_phone(&self, phone_number: &str) -> Result<PhoneConfigResult, ProviderError>;
    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, ProviderError>;
}
