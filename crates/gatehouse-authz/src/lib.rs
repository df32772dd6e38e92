//! Gatehouse authorization primitives shared by the console service and tests.
//!
//! # Purpose
//! Centralizes role naming, permission grant matching, request evaluation,
//! and UI affordance selection. Nothing in this crate performs I/O.
//!
//! # How it fits
//! The console service loads a role and its permission sets from storage,
//! converts them into [`RoleGrants`] and [`MenuEntry`] values, and asks this
//! crate for a verdict. Store mutations use [`derive_role_type`] and
//! [`IdList`] to normalize administrator input before writing.
//!
//! # Key invariants
//! - The role whose type is [`SUPER_ADMIN_TYPE`] is authorized for every request.
//! - Evaluation is a pure function of the role grants and the request.
//! - Role types are uppercase, trimmed, and underscore-separated.
//!
//! # Examples
//! ```rust
//! use gatehouse_authz::{HttpMethod, RequestDescriptor, RoleGrants, RouteGrant, Verdict, evaluate};
//!
//! let role = RoleGrants::new(
//!     "EDITOR",
//!     vec![RouteGrant::new(HttpMethod::Get, "/v1/roles/:id")],
//! );
//! let request = RequestDescriptor::new(HttpMethod::Get, "/v1/roles/7");
//! assert_eq!(evaluate(&role, &request), Verdict::Authorized);
//! ```
//!
//! # Common pitfalls
//! - Comparing role names instead of role types when checking for the super admin.
//! - Passing raw request URIs with query strings; use [`normalize_route`] first
//!   or build a [`RequestDescriptor`], which normalizes on construction.

mod affordance;
mod errors;
mod evaluator;
mod grant;
mod matcher;
mod membership;
mod method;
mod role_type;
mod route;

pub use affordance::{MenuEntry, MenuSection, can_render, menu_for};
pub use errors::{AuthzError, AuthzResult};
pub use evaluator::{RequestDescriptor, Verdict, evaluate};
pub use grant::{RoleGrants, RouteGrant};
pub use matcher::GrantMatcher;
pub use membership::{IdList, IdValue};
pub use method::HttpMethod;
pub use role_type::{
    SUPER_ADMIN_TYPE, derive_role_type, identity_key, is_super_admin, normalize_role_name,
};
pub use route::{RoutePattern, is_pattern, normalize_route, route_matches, validate_route};
