mod admin;
mod client;
mod consultation;

pub use admin::AdminAuth;
pub use client::client_ip;
pub use consultation::{
    get_by_id_handler, list_handler, stats_handler, submit_handler, update_status_handler,
};
