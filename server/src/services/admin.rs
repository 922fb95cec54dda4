use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::admin::{
    AdminAction, NewAdminAction, Report, ReportResolution, ACTION_EVENT_MODERATION,
    ACTION_REPORT_RESOLUTION, ACTION_ROLE_CHANGE,
};
use crate::models::event::{Event, EventModeration, ModerateEventRequest, ModerationStatus};
use crate::models::profile::UserSummary;
use crate::models::role::{Role, RoleAssignment};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

pub const DEFAULT_ACTION_LIMIT: i64 = 50;
pub const MAX_ACTION_LIMIT: i64 = 200;

/// Back-office operations. Every mutation is written to the audit log.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        Ok(self.store.list_users().await?)
    }

    pub async fn assign_role(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> AppResult<RoleAssignment> {
        let assignment = self.store.assign_role(user_id, role, admin_id).await?;
        info!(%admin_id, %user_id, role = role.as_str(), "Role assigned");

        self.audit(NewAdminAction {
            admin_id,
            action_type: ACTION_ROLE_CHANGE,
            target_type: "user",
            target_id: user_id,
            details: Some(json!({ "role": role.as_str() })),
        })
        .await;
        Ok(assignment)
    }

    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        Ok(self.store.list_all_events().await?)
    }

    pub async fn moderate_event(
        &self,
        admin_id: Uuid,
        event_id: Uuid,
        request: ModerateEventRequest,
    ) -> AppResult<Event> {
        if request.status == ModerationStatus::Pending {
            return Err(AppError::ValidationError(
                "Moderation status must be approved or rejected".to_string(),
            ));
        }
        let notes = request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let event = self
            .store
            .moderate_event(
                event_id,
                EventModeration {
                    status: request.status,
                    moderator: admin_id,
                    notes: notes.clone(),
                    at: Utc::now(),
                },
            )
            .await?;
        info!(%admin_id, %event_id, status = ?request.status, "Event moderated");

        self.audit(NewAdminAction {
            admin_id,
            action_type: ACTION_EVENT_MODERATION,
            target_type: "event",
            target_id: event_id,
            details: Some(json!({ "status": request.status, "notes": notes })),
        })
        .await;
        Ok(event)
    }

    pub async fn list_reports(&self) -> AppResult<Vec<Report>> {
        Ok(self.store.list_reports().await?)
    }

    pub async fn resolve_report(
        &self,
        admin_id: Uuid,
        report_id: Uuid,
        resolution: ReportResolution,
    ) -> AppResult<Report> {
        let report = self
            .store
            .resolve_report(report_id, resolution, admin_id)
            .await?;
        info!(%admin_id, %report_id, resolution = resolution.as_str(), "Report resolved");

        self.audit(NewAdminAction {
            admin_id,
            action_type: ACTION_REPORT_RESOLUTION,
            target_type: "report",
            target_id: report_id,
            details: Some(json!({ "resolution": resolution.as_str() })),
        })
        .await;
        Ok(report)
    }

    pub async fn actions(&self, limit: Option<i64>) -> AppResult<Vec<AdminAction>> {
        let limit = limit
            .unwrap_or(DEFAULT_ACTION_LIMIT)
            .clamp(1, MAX_ACTION_LIMIT);
        Ok(self.store.admin_actions(limit).await?)
    }

    // The change itself already happened; a lost audit row must not undo it.
    async fn audit(&self, action: NewAdminAction) {
        let action_type = action.action_type;
        let target_id = action.target_id;
        if let Err(e) = self.store.record_admin_action(action).await {
            warn!(action_type, %target_id, error = ?e, "Failed to record admin action");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::fixtures::event;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_assign_role_is_audited_and_wins() {
        let store = Arc::new(MemoryStore::new());
        let service = AdminService::new(store.clone());
        let (admin, user) = (Uuid::new_v4(), Uuid::new_v4());

        service.assign_role(admin, user, Role::Organizer).await.unwrap();

        assert_eq!(store.latest_role(user).await.unwrap(), Some(Role::Organizer));
        let actions = service.actions(None).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, ACTION_ROLE_CHANGE);
        assert_eq!(actions[0].target_id, user);
    }

    #[tokio::test]
    async fn test_pending_is_not_a_moderation_decision() {
        let store = Arc::new(MemoryStore::new());
        let event = event(Decimal::ZERO, None, 0);
        let event_id = event.id;
        store.insert_event(event);
        let service = AdminService::new(store);

        let result = service
            .moderate_event(
                Uuid::new_v4(),
                event_id,
                ModerateEventRequest {
                    status: ModerationStatus::Pending,
                    notes: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));

        let moderated = service
            .moderate_event(
                Uuid::new_v4(),
                event_id,
                ModerateEventRequest {
                    status: ModerationStatus::Approved,
                    notes: Some("looks fine".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(moderated.moderation_status, ModerationStatus::Approved);
        assert_eq!(moderated.moderation_notes.as_deref(), Some("looks fine"));
    }

    #[tokio::test]
    async fn test_resolving_unknown_report_is_not_found() {
        let service = AdminService::new(Arc::new(MemoryStore::new()));
        let result = service
            .resolve_report(Uuid::new_v4(), Uuid::new_v4(), ReportResolution::Dismissed)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
