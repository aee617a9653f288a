use std::fmt;
use tracing::{debug, info};

use super::endpoint::{check_placeholder_segments, count_path_params, BraceError, Endpoint, SegmentError};
use super::method::{AnyExpansion, Verb};

/// Registration and validation failures. All of them are configuration bugs:
/// the server must not start with any of these outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Same method already registered for the same full path.
    Duplicate { method: Verb, full_path: String },
    /// Registration attempted after the dispatcher froze the registry.
    Frozen,
    /// Path does not begin with `/`.
    MissingLeadingSlash { path: String },
    /// Unbalanced `{` / `}` in the path.
    Braces { path: String, problem: BraceError },
    /// A placeholder that does not fill a whole segment, or a misplaced tail.
    Placeholder {
        path: String,
        segment: String,
        problem: SegmentError,
    },
    /// Placeholder count differs from declared path params.
    PathParamCount {
        path: String,
        placeholders: usize,
        declared: usize,
    },
    /// Empty method set.
    NoMethods { path: String },
    /// A request example without any documented json field.
    UndocumentedBody { path: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate { method, full_path } => {
                write!(f, "duplicate endpoint: {method} {full_path}")
            }
            RegistryError::Frozen => write!(f, "registry is frozen; register before binding"),
            RegistryError::MissingLeadingSlash { path } => {
                write!(f, "path must begin with '/': {path}")
            }
            RegistryError::Braces { path, problem } => {
                let what = match problem {
                    BraceError::Unopened => "'}' without a matching '{'",
                    BraceError::Nested => "nested '{'",
                    BraceError::Unclosed => "unclosed '{'",
                };
                write!(f, "path {path} has {what}")
            }
            RegistryError::Placeholder {
                path,
                segment,
                problem,
            } => {
                let what = match problem {
                    SegmentError::Embedded => "must be a whole segment",
                    SegmentError::Unnamed => "has no name",
                    SegmentError::TailNotLast => "must be the last segment",
                };
                write!(f, "path {path}: placeholder '{segment}' {what}")
            }
            RegistryError::PathParamCount {
                path,
                placeholders,
                declared,
            } => write!(
                f,
                "path {path} has {placeholders} placeholders but {declared} path params"
            ),
            RegistryError::NoMethods { path } => write!(f, "endpoint {path} declares no methods"),
            RegistryError::UndocumentedBody { path } => write!(
                f,
                "endpoint {path} has a request body example but no json fields"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Append-then-freeze collection of endpoint descriptors.
///
/// Built single-threaded at startup, then handed to the dispatcher which binds
/// it and freezes it. After that it is only read (docs, introspection).
#[derive(Debug, Default)]
pub struct Registry {
    endpoints: Vec<Endpoint>,
    any: AnyExpansion,
    frozen: bool,
    validated: bool,
}

impl Registry {
    #[must_use]
    pub fn new(any: AnyExpansion) -> Self {
        Self {
            endpoints: Vec::new(),
            any,
            frozen: false,
            validated: false,
        }
    }

    /// Add endpoints, computing each full path.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Duplicate`] when an effective method of a new endpoint
    /// is already registered for the same full path (`Any` is expanded under
    /// this registry's policy for the comparison), [`RegistryError::Frozen`]
    /// after [`Registry::freeze`]. Endpoints before the failing one stay added.
    pub fn register(
        &mut self,
        endpoints: impl IntoIterator<Item = Endpoint>,
    ) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen);
        }
        for mut endpoint in endpoints {
            endpoint.full_path = endpoint.build_full_path();
            let wanted = self.any.resolve(&endpoint.methods);
            for existing in self
                .endpoints
                .iter()
                .filter(|e| e.full_path == endpoint.full_path)
            {
                let taken = self.any.resolve(&existing.methods);
                if let Some(method) = wanted.iter().find(|m| taken.contains(m)) {
                    return Err(RegistryError::Duplicate {
                        method: *method,
                        full_path: endpoint.full_path,
                    });
                }
            }
            debug!(
                name = %endpoint.name,
                methods = %endpoint.method_list(),
                full_path = %endpoint.full_path,
                "Endpoint registered"
            );
            self.endpoints.push(endpoint);
            self.validated = false;
        }
        Ok(())
    }

    /// Structural checks over every descriptor; returns the first failure.
    ///
    /// # Errors
    ///
    /// See the [`RegistryError`] variants other than `Duplicate` and `Frozen`.
    pub fn validate(&mut self) -> Result<(), RegistryError> {
        for e in &self.endpoints {
            if !e.path.starts_with('/') {
                return Err(RegistryError::MissingLeadingSlash {
                    path: e.path.clone(),
                });
            }
            let placeholders =
                count_path_params(&e.path).map_err(|problem| RegistryError::Braces {
                    path: e.path.clone(),
                    problem,
                })?;
            check_placeholder_segments(&e.path).map_err(|(segment, problem)| {
                RegistryError::Placeholder {
                    path: e.path.clone(),
                    segment,
                    problem,
                }
            })?;
            if placeholders != e.path_params.len() {
                return Err(RegistryError::PathParamCount {
                    path: e.path.clone(),
                    placeholders,
                    declared: e.path_params.len(),
                });
            }
            if e.methods.is_empty() {
                return Err(RegistryError::NoMethods {
                    path: e.path.clone(),
                });
            }
            if e.request_body_example.is_some() && e.json_fields.is_empty() {
                return Err(RegistryError::UndocumentedBody {
                    path: e.path.clone(),
                });
            }
        }
        self.validated = true;
        info!(endpoints = self.endpoints.len(), "Registry validated");
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether [`Registry::validate`] has passed since the last registration.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    #[must_use]
    pub fn any_expansion(&self) -> &AnyExpansion {
        &self.any
    }

    /// Descriptors in registration order.
    #[must_use]
    pub fn list(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// First descriptor registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub(crate) fn endpoints_mut(&mut self) -> &mut [Endpoint] {
        &mut self.endpoints
    }
}
