mod consultation;

pub use consultation::{
    validate_company, validate_consultation_form, validate_email, validate_full_name,
    validate_message, validate_phone, FieldError,
};
