use actix_web::{web, Either, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

use crate::{
    config::RateLimitConfig,
    handlers::{client_ip, AdminAuth},
    models::{ConsultationQueryParams, ConsultationStatusUpdate, NewConsultationRequest},
    services::ConsultationServiceTrait,
    types::Result,
};

/// Public consultation form submission, as JSON or urlencoded form data
pub async fn submit_handler<S: ConsultationServiceTrait + 'static>(
    req: HttpRequest,
    dto: Either<web::Json<NewConsultationRequest>, web::Form<NewConsultationRequest>>,
    service: web::Data<S>,
    limits: web::Data<RateLimitConfig>,
) -> Result<impl Responder> {
    let dto = match dto {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    let ip = client_ip(&req, limits.trust_proxy);
    let outcome = service.submit(dto, &ip).await?;
    Ok(HttpResponse::Ok()
        .insert_header(("X-RateLimit-Limit", outcome.limit.to_string()))
        .insert_header(("X-RateLimit-Remaining", outcome.remaining.to_string()))
        .json(outcome.response))
}

/// Admin listing, newest first
pub async fn list_handler<S: ConsultationServiceTrait + 'static>(
    _admin: AdminAuth,
    query: web::Query<ConsultationQueryParams>,
    service: web::Data<S>,
) -> Result<impl Responder> {
    let requests = service.list(&query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": requests,
        "message": "Successfully retrieved consultation requests",
    })))
}

pub async fn stats_handler<S: ConsultationServiceTrait + 'static>(
    _admin: AdminAuth,
    service: web::Data<S>,
) -> Result<impl Responder> {
    let stats = service.stats().await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": stats,
        "message": "Successfully retrieved consultation statistics",
    })))
}

pub async fn get_by_id_handler<S: ConsultationServiceTrait + 'static>(
    _admin: AdminAuth,
    id: web::Path<Uuid>,
    service: web::Data<S>,
) -> Result<impl Responder> {
    let request = service.get_by_id(&id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": request,
        "message": "Successfully retrieved consultation request",
    })))
}

pub async fn update_status_handler<S: ConsultationServiceTrait + 'static>(
    _admin: AdminAuth,
    id: web::Path<Uuid>,
    update: web::Json<ConsultationStatusUpdate>,
    service: web::Data<S>,
) -> Result<impl Responder> {
    let id = id.into_inner();
    let request = service.update_status(&id, update.status).await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": request,
        "message": format!("Consultation request '{}' is now {}", id, request.status),
    })))
}
