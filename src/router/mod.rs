//! # Router Module
//!
//! Path matching for bound endpoints. Patterns such as `/v1/test/{id}` are
//! split into segments and stored in a radix tree keyed per HTTP method.
//!
//! ```rust
//! use brrtapi::router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/pets/{id}", "get_pet").unwrap();
//!
//! let m = router.route(&Method::GET, "/pets/123").unwrap();
//! assert_eq!(*m.route, "get_pet");
//! assert_eq!(m.get_path_param("id"), Some("123"));
//! assert!(router.allows_path("/pets/9"));
//! ```

mod core;
mod radix;

pub use core::{ParamVec, RouteError, RouteMatch, Router, MAX_INLINE_PARAMS};
