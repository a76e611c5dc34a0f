mod request_logger;
mod security_headers;

pub use request_logger::RequestLogger;
pub use security_headers::security_headers;
