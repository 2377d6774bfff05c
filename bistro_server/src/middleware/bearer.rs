//! Access token authentication middleware.
//!
//! Placed on any scope that requires a logged-in caller. It verifies the bearer token's signature
//! and expiry, and inserts the resulting [`AccessClaims`] into the request extensions, where
//! handlers (via the `AccessClaims` extractor) and the ACL middleware pick them up.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};

use crate::{auth::TokenIssuer, errors::ServerError};

pub struct BearerAuthFactory {
    verifier: TokenIssuer,
}

impl BearerAuthFactory {
    pub fn new(verifier: TokenIssuer) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuthFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = BearerAuthService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthService { verifier: self.verifier.clone(), service: Rc::new(service) })
    }
}

pub struct BearerAuthService<S> {
    verifier: TokenIssuer,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
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
        let verifier = self.verifier.clone();
        Box::pin(async move {
            let token = crate::auth::extract_token(req.request())
                .ok_or(ServerError::CouldNotDeserializeAuthToken)?;
            let claims = verifier.decode_token(&token).map_err(ServerError::AuthenticationError)?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
