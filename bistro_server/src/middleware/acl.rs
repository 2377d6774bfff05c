//! Access control list middleware.
//! This middleware can be placed on any route or service.
//!
//! It checks the [`AccessClaims`] that the bearer-auth middleware placed in the request extensions
//! against the required roles for the route. If the caller holds one of the required roles, the
//! request continues; otherwise a 403 Forbidden response is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError},
    Error,
    HttpMessage,
};
use bistro_engine::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::auth::AccessClaims;

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let claims = req
                .extensions()
                .get::<AccessClaims>()
                .ok_or_else(|| {
                    log::warn!("🔑️ No access claims found in request extensions");
                    ErrorInternalServerError("No access claims found in request extensions")
                })?
                .clone();
            if allowed_roles.contains(&claims.role) {
                service.call(req).await
            } else {
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
