use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::models::booking::BookingDetails;
use crate::models::profile::{Profile, UpdateProfileRequest};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<Profile> {
        self.store
            .profile_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    /// Partial update; the profile row is created on first write.
    pub async fn update(&self, user_id: Uuid, request: UpdateProfileRequest) -> AppResult<Profile> {
        if matches!(&request.email, Some(email) if !email.trim().is_empty() && !email.contains('@'))
        {
            return Err(AppError::ValidationError("Email is not valid".to_string()));
        }
        let profile = self.store.upsert_profile(user_id, request).await?;
        info!(%user_id, "Profile updated");
        Ok(profile)
    }

    /// The caller's bookings, newest first.
    pub async fn bookings(&self, user_id: Uuid) -> AppResult<Vec<BookingDetails>> {
        Ok(self.store.bookings_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_update_creates_then_merges() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()));
        let user_id = Uuid::new_v4();

        assert!(matches!(service.get(user_id).await, Err(AppError::NotFound(_))));

        service
            .update(
                user_id,
                UpdateProfileRequest {
                    full_name: Some("Ada Lovelace".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();
        let profile = service
            .update(
                user_id,
                UpdateProfileRequest {
                    bio: Some("Analyst".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.bio.as_deref(), Some("Analyst"));
    }

    #[tokio::test]
    async fn test_bad_email_rejected() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()));
        let result = service
            .update(
                Uuid::new_v4(),
                UpdateProfileRequest {
                    email: Some("nope".to_string()),
                    ..UpdateProfileRequest::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
