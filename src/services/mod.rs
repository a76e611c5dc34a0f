use std::sync::Arc;

use actix_web::web;

mod consultation;
pub mod email;
pub mod rate_limiter;

pub use consultation::{
    ConsultationService, ConsultationServiceTrait, ConsultationSettings,
    SUBMISSION_ACCEPTED_MESSAGE,
};

use crate::{
    db::Database,
    repositories::ConsultationRepository,
    services::{email::HttpMailer, rate_limiter::RateLimiter},
};

pub type ConsultationServiceType = ConsultationService<ConsultationRepository, HttpMailer>;

/// Wires the consultation service over the database and mailer.
///
/// Built once and shared by every worker so the rate limiter state is global
/// to the process.
pub fn build(
    db: Database,
    mailer: HttpMailer,
    limiter: Arc<RateLimiter>,
    settings: ConsultationSettings,
) -> web::Data<ConsultationServiceType> {
    let repository = ConsultationRepository::new(db);
    web::Data::new(ConsultationService::new(
        Arc::new(repository),
        Arc::new(mailer),
        limiter,
        settings,
    ))
}

/// Service Register
pub fn register(service: web::Data<ConsultationServiceType>, cfg: &mut web::ServiceConfig) {
    cfg.app_data(service);
}
