mod consultation;

pub use consultation::{
    ConsultationQueryParams, ConsultationRequest, ConsultationStats, ConsultationStatus,
    ConsultationStatusUpdate, NewConsultationRecord, NewConsultationRequest, SubmissionResponse,
};
