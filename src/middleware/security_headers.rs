use actix_web::middleware::DefaultHeaders;

/// Headers attached to every response the site serves
pub const SECURITY_HEADERS: [(&str, &str); 9] = [
    (
        "Content-Security-Policy",
        "default-src 'self'; \
         script-src 'self' 'unsafe-inline' 'unsafe-eval' https://cdn.jsdelivr.net https://fonts.googleapis.com; \
         style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
         img-src 'self' data: https:; \
         font-src 'self' https://fonts.gstatic.com data:; \
         connect-src 'self' https:; \
         frame-ancestors 'none'; \
         base-uri 'self'; \
         form-action 'self'",
    ),
    ("X-Content-Type-Options", "nosniff"),
    ("X-XSS-Protection", "1; mode=block"),
    ("X-Frame-Options", "DENY"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    (
        "Strict-Transport-Security",
        "max-age=31536000; includeSubDomains; preload",
    ),
    (
        "Permissions-Policy",
        "geolocation=(), microphone=(), camera=(), payment=(), usb=(), \
         magnetometer=(), gyroscope=(), accelerometer=()",
    ),
    ("X-Permitted-Cross-Domain-Policies", "none"),
    ("X-UA-Compatible", "IE=edge"),
];

/// Middleware that adds `SECURITY_HEADERS`; values a handler already set are left alone
pub fn security_headers() -> DefaultHeaders {
    SECURITY_HEADERS
        .iter()
        .fold(DefaultHeaders::new(), |headers, (name, value)| {
            headers.add((*name, *value))
        })
}
