use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::models::admin::{CreateReportRequest, NewReport, Report};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Files a report against exactly one user or one event.
    pub async fn file(&self, reporter_id: Uuid, request: CreateReportRequest) -> AppResult<Report> {
        let report_type = match (request.reported_user_id, request.reported_event_id) {
            (Some(_), None) => "user",
            (None, Some(event_id)) => {
                self.store.event_by_id(event_id).await?;
                "event"
            }
            _ => {
                return Err(AppError::ValidationError(
                    "A report must target exactly one user or event".to_string(),
                ))
            }
        };

        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::ValidationError("Reason is required".to_string()));
        }

        let report = self
            .store
            .create_report(NewReport {
                reporter_id,
                report_type,
                reported_user_id: request.reported_user_id,
                reported_event_id: request.reported_event_id,
                reason,
                details: request.details.filter(|d| !d.trim().is_empty()),
            })
            .await?;
        info!(report_id = %report.id, %reporter_id, report_type, "Report filed");
        Ok(report)
    }
}
