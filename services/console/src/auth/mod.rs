//! Console authentication and authorization.
//!
//! # Purpose
//! Groups bearer-token handling, identity resolution, and the request gate
//! that runs the authorization evaluator in front of protected routes.
pub mod gate;
pub mod identity;
pub mod principal;
pub mod token;
