mod consultation;

pub use consultation::{ConsultationRepository, ConsultationRepositoryTrait};

#[cfg(test)]
pub use consultation::MockConsultationRepositoryTrait;
