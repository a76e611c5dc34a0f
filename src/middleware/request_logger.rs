use std::rc::Rc;
use std::time::{Duration, Instant};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::{debug, warn};

/// API calls slower than this are logged at warn level
const SLOW_REQUEST: Duration = Duration::from_secs(2);

/// Logs method, path, status and latency of each request.
///
/// Peer addresses and bodies are never logged; the access log emitted by
/// `actix_web::middleware::Logger` is configured without `%a` for the same reason.
pub struct RequestLogger {
    enable_debug_logging: bool,
}

impl RequestLogger {
    pub fn new(enable_debug_logging: bool) -> Self {
        Self {
            enable_debug_logging,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerMiddleware {
            service: Rc::new(service),
            enable_debug_logging: self.enable_debug_logging,
        })
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
    enable_debug_logging: bool,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let enable_debug_logging = self.enable_debug_logging;

        // Static assets are covered by the access log
        if !req.path().starts_with("/api") {
            return Box::pin(service.call(req));
        }

        let path = req.path().to_owned();
        let method = req.method().clone();
        let started = Instant::now();

        if enable_debug_logging {
            debug!("Processing request: {} {}", method, path);
        }

        Box::pin(async move {
            let res = service.call(req).await?;
            let elapsed = started.elapsed();

            if elapsed > SLOW_REQUEST {
                warn!(
                    "Slow request: {} {} - status: {} in {}ms",
                    method,
                    path,
                    res.status(),
                    elapsed.as_millis()
                );
            } else if enable_debug_logging {
                debug!(
                    "Response: {} {} - status: {} in {}ms",
                    method,
                    path,
                    res.status(),
                    elapsed.as_millis()
                );
            }
            Ok(res)
        })
    }
}
