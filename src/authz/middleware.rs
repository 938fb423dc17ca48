use std::str;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header::ContentType;
use actix_web::middleware::Next;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use log::{debug, error, info};

use super::{Authorizer, AuthzRequest, Decision};

pub const FORBIDDEN_BODY: &str = "Forbidden";

/// Middleware function applying the registered [`Authorizer`] to every
/// request. Wrap it with [`actix_web::middleware::from_fn`] and register
/// the authorizer as `Data<dyn Authorizer>`.
///
/// Allowed requests are handed to the next service untouched; everything
/// else ends here with `403 Forbidden`.
pub async fn authorize<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let authz = match req.app_data::<Data<dyn Authorizer>>() {
        Some(authz) => authz.clone(),
        None => {
            error!(
                "No authorizer registered, reject {} {}",
                req.method(),
                req.path()
            );
            return Err(ErrorInternalServerError("authorizer is not configured"));
        }
    };

    let decision = {
        // Values that are not valid UTF-8 are treated like a missing header.
        let user = req
            .headers()
            .get(authz.user_header())
            .and_then(|value| str::from_utf8(value.as_bytes()).ok())
            .unwrap_or_default();

        // The percent-decoded path, the same one the router and the
        // upstream proxy see. Only `%2F`, `%25` and `%2B` stay encoded.
        let authz_req = AuthzRequest {
            path: req.match_info().as_str(),
            method: req.method().as_str(),
            user,
        };
        let decision = authz.authorize_request(&authz_req);
        match decision {
            Decision::Pass => debug!(
                "Pass {} {} [user '{}']",
                authz_req.method, authz_req.path, authz_req.user
            ),
            Decision::Forbidden => info!(
                "Forbid {} {} [user '{}']",
                authz_req.method, authz_req.path, authz_req.user
            ),
        }
        decision
    };

    match decision {
        Decision::Pass => next.call(req).await.map(ServiceResponse::map_into_left_body),
        Decision::Forbidden => {
            let resp = HttpResponse::Forbidden()
                .content_type(ContentType::plaintext())
                .body(FORBIDDEN_BODY);
            Ok(req.into_response(resp).map_into_right_body())
        }
    }
}
