//! Build and version information reported by the root route.

use serde::Serialize;

/// Name reported as `app_name`.
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// `build` is the toolchain target, `version` the crate version and
/// `build_time` the UTC build time when the build sets `BRRTAPI_BUILD_TIME`
/// (`"-"` otherwise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub build: String,
    pub version: String,
    pub build_time: String,
}

impl VersionInfo {
    #[must_use]
    pub fn current() -> Self {
        Self {
            build: format!("rust ({})", std::env::consts::ARCH),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_time: option_env!("BRRTAPI_BUILD_TIME").unwrap_or("-").to_string(),
        }
    }
}

/// Body of the root route.
#[derive(Debug, Clone, Serialize)]
pub struct Home {
    pub app_name: String,
    #[serde(rename = "Version")]
    pub version: VersionInfo,
}

impl Home {
    #[must_use]
    pub fn current() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            version: VersionInfo::current(),
        }
    }
}
