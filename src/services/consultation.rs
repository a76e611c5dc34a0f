// src/services/consultation.rs - Business logic
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{ServiceError, SUBMISSION_FAILED_MESSAGE};
use crate::models::{
    ConsultationQueryParams, ConsultationRequest, ConsultationStats, ConsultationStatus,
    NewConsultationRecord, NewConsultationRequest, SubmissionResponse,
};
use crate::repositories::ConsultationRepositoryTrait;
use crate::services::email::{
    client_confirmation_email, consultation_notification_email, Mailer,
};
use crate::services::rate_limiter::RateLimiter;
use crate::utils::{hash::fingerprint_ip, mask::mask_email};
use crate::validations::validate_consultation_form;

type Result<T> = std::result::Result<T, ServiceError>;

pub const SUBMISSION_ACCEPTED_MESSAGE: &str =
    "Your consultation request has been submitted successfully.";

#[async_trait]
pub trait ConsultationServiceTrait {
    /// Validates, rate-limits, stores and announces a public submission.
    ///
    /// Rate limiting runs before storage: a rejected submission is never
    /// stored and never mailed.
    async fn submit(
        &self,
        dto: NewConsultationRequest,
        client_ip: &str,
    ) -> Result<SubmissionOutcome>;
    async fn list(&self, params: &ConsultationQueryParams) -> Result<Vec<ConsultationRequest>>;
    async fn get_by_id(&self, id: &Uuid) -> Result<ConsultationRequest>;
    async fn update_status(
        &self,
        id: &Uuid,
        status: ConsultationStatus,
    ) -> Result<ConsultationRequest>;
    async fn stats(&self) -> Result<ConsultationStats>;
}

/// An accepted submission and the client's budget as of that attempt
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub response: SubmissionResponse,
    /// Submissions allowed per window
    pub limit: u32,
    pub remaining: u32,
}

/// Settings the service needs beyond its collaborators
#[derive(Debug, Clone)]
pub struct ConsultationSettings {
    /// Owner inbox for notifications, also quoted in client confirmations
    pub notify_address: String,
    pub ip_hash_salt: String,
}

pub struct ConsultationService<R: ConsultationRepositoryTrait, M: Mailer> {
    repository: Arc<R>,
    mailer: Arc<M>,
    limiter: Arc<RateLimiter>,
    settings: ConsultationSettings,
}

impl<R: ConsultationRepositoryTrait, M: Mailer> ConsultationService<R, M> {
    pub fn new(
        repository: Arc<R>,
        mailer: Arc<M>,
        limiter: Arc<RateLimiter>,
        settings: ConsultationSettings,
    ) -> Self {
        Self {
            repository,
            mailer,
            limiter,
            settings,
        }
    }

    async fn send_notifications(&self, request: &NewConsultationRequest) {
        let notification =
            consultation_notification_email(request, &self.settings.notify_address);
        if !self.mailer.send(&notification).await {
            warn!("[Consultation] Owner notification was not delivered");
        }

        let confirmation = client_confirmation_email(
            &request.full_name,
            &request.email,
            &self.settings.notify_address,
        );
        if !self.mailer.send(&confirmation).await {
            warn!(
                "[Consultation] Confirmation to {} was not delivered",
                mask_email(&request.email)
            );
        }
    }
}

#[async_trait]
impl<R, M> ConsultationServiceTrait for ConsultationService<R, M>
where
    R: ConsultationRepositoryTrait + Send + Sync,
    M: Mailer + Send + Sync,
{
    async fn submit(
        &self,
        dto: NewConsultationRequest,
        client_ip: &str,
    ) -> Result<SubmissionOutcome> {
        let field_errors = validate_consultation_form(&dto);
        if !field_errors.is_empty() {
            debug!("Rejected submission with {} invalid fields", field_errors.len());
            return Err(ServiceError::from_field_errors(field_errors));
        }

        let client_fingerprint = fingerprint_ip(client_ip, &self.settings.ip_hash_salt);
        let decision = self.limiter.attempt(client_ip);
        if !decision.allowed {
            info!(
                "[SECURE] Rate limit reached for client {}, retry in {}s",
                client_fingerprint, decision.reset_after_secs
            );
            return Err(ServiceError::RateLimited {
                retry_after_secs: decision.reset_after_secs,
            });
        }

        let request = dto.trimmed();
        let record = NewConsultationRecord {
            full_name: request.full_name.clone(),
            company: request.company.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            message: request.message.clone(),
            status: ConsultationStatus::New,
            client_ip_hash: Some(client_fingerprint),
        };

        let stored = self.repository.save(&record).await.map_err(|e| {
            error!("[Consultation] Submission error: {}", e);
            ServiceError::Internal(SUBMISSION_FAILED_MESSAGE.to_string())
        })?;

        info!(
            "[SECURE] Consultation request received: id={}, email={}, remaining={}",
            stored.id,
            mask_email(&stored.email),
            decision.remaining
        );

        self.send_notifications(&request).await;

        Ok(SubmissionOutcome {
            response: SubmissionResponse {
                success: true,
                message: SUBMISSION_ACCEPTED_MESSAGE.to_string(),
            },
            limit: self.limiter.max_requests(),
            remaining: decision.remaining,
        })
    }

    async fn list(&self, params: &ConsultationQueryParams) -> Result<Vec<ConsultationRequest>> {
        Ok(self.repository.find(params).await?)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<ConsultationRequest> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Consultation request {} not found", id)))
    }

    async fn update_status(
        &self,
        id: &Uuid,
        status: ConsultationStatus,
    ) -> Result<ConsultationRequest> {
        let affected = self.repository.update_status(id, status).await?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Consultation request {} not found",
                id
            )));
        }
        info!("Consultation request {} marked {}", id, status);
        self.get_by_id(id).await
    }

    async fn stats(&self) -> Result<ConsultationStats> {
        Ok(self.repository.count_by_status().await?)
    }
}
