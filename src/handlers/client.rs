use std::net::SocketAddr;

use actix_web::HttpRequest;

/// Key used when the peer address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolves the address a submission is attributed to.
///
/// Forwarding headers are only honoured when `trust_proxy` is set; otherwise
/// a client could pick its own rate-limit bucket.
pub fn client_ip(req: &HttpRequest, trust_proxy: bool) -> String {
    let info = req.connection_info();
    let raw = if trust_proxy {
        info.realip_remote_addr()
    } else {
        info.peer_addr()
    };

    match raw {
        Some(addr) => normalize(addr),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

fn normalize(addr: &str) -> String {
    addr.parse::<SocketAddr>()
        .map(|socket| socket.ip().to_string())
        .unwrap_or_else(|_| addr.trim().to_string())
}
