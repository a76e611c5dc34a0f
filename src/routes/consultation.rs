use actix_web::web;

use crate::{
    handlers::{
        get_by_id_handler, list_handler, stats_handler, submit_handler, update_status_handler,
    },
    services::ConsultationServiceTrait,
};

// Configure consultation routes; `/stats` must be registered before `/{id}`
pub fn configure_routes<S: ConsultationServiceTrait + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/consultation", web::post().to(submit_handler::<S>))
        .service(
            web::scope("/consultations")
                .route("", web::get().to(list_handler::<S>))
                .route("/stats", web::get().to(stats_handler::<S>))
                .route("/{id}", web::get().to(get_by_id_handler::<S>))
                .route("/{id}", web::patch().to(update_status_handler::<S>)),
        );
}
