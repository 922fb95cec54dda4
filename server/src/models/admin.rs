use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const ACTION_ROLE_CHANGE: &str = "role_change";
pub const ACTION_EVENT_MODERATION: &str = "event_moderation";
pub const ACTION_REPORT_RESOLUTION: &str = "report_resolution";
pub const ACTION_CHECKOUT_RECONCILIATION: &str = "checkout_reconciliation";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action_type: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdminAction {
    pub admin_id: Uuid,
    pub action_type: &'static str,
    pub target_type: &'static str,
    pub target_id: Uuid,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub report_type: String,
    pub reported_user_id: Option<Uuid>,
    pub reported_event_id: Option<Uuid>,
    pub reason: String,
    pub details: Option<String>,
    pub status: String,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub report_type: &'static str,
    pub reported_user_id: Option<Uuid>,
    pub reported_event_id: Option<Uuid>,
    pub reason: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReportRequest {
    pub reported_user_id: Option<Uuid>,
    pub reported_event_id: Option<Uuid>,
    pub reason: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportResolution {
    Resolved,
    Dismissed,
}

impl ReportResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportResolution::Resolved => "resolved",
            ReportResolution::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveReportRequest {
    pub resolution: ReportResolution,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionLogQuery {
    pub limit: Option<i64>,
}
