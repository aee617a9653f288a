//! # Example Routes
//!
//! The endpoints shipped with the scaffold. Each module returns its
//! descriptors; [`register_all`] adds them, plus the reserved `/docs` routes,
//! to a registry.
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `ANY /` | app name and version |
//! | `GET /error?id=` | 400 for `1`, 406 for `2`, otherwise a plain 500 |
//! | `POST /testing` | echoes a [`PostTest`] body |
//! | `GET /v1/test/error` | structured 400 |
//! | `POST /v1/test/post` | echoes a [`PostReq`] as [`PostResp`] |
//! | `GET /v2/test/echo/{word}` | echoes the path parameter |

mod root;
mod v1;
mod v2;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::docs::DocsSite;
use crate::registry::{Registry, RegistryError};

pub use root::PostTest;
pub use v1::{PostReq, PostResp};

/// Register every example endpoint and the documentation routes.
///
/// # Errors
///
/// The first [`RegistryError`] raised while registering.
pub fn register_all(registry: &mut Registry, docs: &Arc<DocsSite>) -> Result<(), RegistryError> {
    registry.register(root::endpoints())?;
    registry.register(v1::endpoints())?;
    registry.register(v2::endpoints())?;
    registry.register(docs.endpoints())?;
    Ok(())
}
