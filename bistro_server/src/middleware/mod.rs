mod acl;
mod bearer;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use bearer::{BearerAuthFactory, BearerAuthService};
