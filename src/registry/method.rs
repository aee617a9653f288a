use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// HTTP method an endpoint is declared for.
///
/// [`Verb::Any`] is a sentinel, not a method: it is expanded into concrete
/// methods by [`AnyExpansion`] when the dispatcher binds routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Delete,
    Connect,
    Trace,
    Any,
}

const VERB_TABLE: [(Verb, &str); 10] = [
    (Verb::Get, "GET"),
    (Verb::Head, "HEAD"),
    (Verb::Options, "OPTIONS"),
    (Verb::Patch, "PATCH"),
    (Verb::Post, "POST"),
    (Verb::Put, "PUT"),
    (Verb::Delete, "DELETE"),
    (Verb::Connect, "CONNECT"),
    (Verb::Trace, "TRACE"),
    (Verb::Any, "ANY"),
];

impl Verb {
    /// Every concrete method, in the order `Any` expands to.
    pub const STANDARD: [Verb; 9] = [
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Options,
        Verb::Connect,
        Verb::Trace,
        Verb::Head,
        Verb::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        VERB_TABLE
            .iter()
            .find(|(v, _)| *v == self)
            .map(|(_, s)| *s)
            .unwrap_or("ANY")
    }

    /// The concrete `http::Method`, `None` for the `Any` sentinel.
    #[must_use]
    pub fn to_http(self) -> Option<http::Method> {
        match self {
            Verb::Get => Some(http::Method::GET),
            Verb::Head => Some(http::Method::HEAD),
            Verb::Options => Some(http::Method::OPTIONS),
            Verb::Patch => Some(http::Method::PATCH),
            Verb::Post => Some(http::Method::POST),
            Verb::Put => Some(http::Method::PUT),
            Verb::Delete => Some(http::Method::DELETE),
            Verb::Connect => Some(http::Method::CONNECT),
            Verb::Trace => Some(http::Method::TRACE),
            Verb::Any => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a method token outside the known table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVerb(pub String);

impl fmt::Display for UnknownVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown http method '{}'", self.0)
    }
}

impl std::error::Error for UnknownVerb {}

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        VERB_TABLE
            .iter()
            .find(|(_, name)| *name == upper)
            .map(|(v, _)| *v)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// Policy for expanding the [`Verb::Any`] sentinel.
///
/// By default `HEAD` and `DELETE` are excluded, so `Any` binds
/// `GET, POST, PUT, PATCH, OPTIONS, CONNECT, TRACE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyExpansion {
    excluded: BTreeSet<Verb>,
}

impl Default for AnyExpansion {
    fn default() -> Self {
        Self::excluding([Verb::Head, Verb::Delete])
    }
}

impl AnyExpansion {
    pub fn excluding(verbs: impl IntoIterator<Item = Verb>) -> Self {
        Self {
            excluded: verbs.into_iter().filter(|v| *v != Verb::Any).collect(),
        }
    }

    /// Build from configuration tokens such as `["HEAD", "DELETE"]`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVerb`] for a token that is not an HTTP method.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownVerb> {
        let verbs = names
            .iter()
            .map(|n| n.as_ref().parse::<Verb>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::excluding(verbs))
    }

    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<Verb> {
        &self.excluded
    }

    /// Concrete methods `Any` stands for under this policy.
    #[must_use]
    pub fn expand(&self) -> Vec<Verb> {
        Verb::STANDARD
            .iter()
            .copied()
            .filter(|v| !self.excluded.contains(v))
            .collect()
    }

    /// Replace any `Any` entries in `methods` with the expansion, keeping order and
    /// dropping duplicates.
    #[must_use]
    pub fn resolve(&self, methods: &[Verb]) -> Vec<Verb> {
        let mut out: Vec<Verb> = Vec::with_capacity(methods.len());
        for m in methods {
            if *m == Verb::Any {
                for e in self.expand() {
                    if !out.contains(&e) {
                        out.push(e);
                    }
                }
            } else if !out.contains(m) {
                out.push(*m);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_string_table() {
        assert_eq!(Verb::Get.as_str(), "GET");
        assert_eq!(Verb::Any.to_string(), "ANY");
        assert_eq!("patch".parse::<Verb>(), Ok(Verb::Patch));
        assert!("FETCH".parse::<Verb>().is_err());
        assert_eq!(Verb::Trace.to_http(), Some(http::Method::TRACE));
        assert_eq!(Verb::Any.to_http(), None);
    }

    #[test]
    fn test_default_expansion_skips_head_and_delete() {
        let expanded = AnyExpansion::default().expand();
        assert_eq!(
            expanded,
            vec![
                Verb::Get,
                Verb::Post,
                Verb::Put,
                Verb::Patch,
                Verb::Options,
                Verb::Connect,
                Verb::Trace
            ]
        );
    }

    #[test]
    fn test_configurable_exclusions() {
        let policy = AnyExpansion::from_names(&["trace", "CONNECT"]).unwrap();
        let expanded = policy.expand();
        assert!(expanded.contains(&Verb::Head));
        assert!(expanded.contains(&Verb::Delete));
        assert!(!expanded.contains(&Verb::Trace));
        assert!(!expanded.contains(&Verb::Connect));
    }

    #[test]
    fn test_resolve_dedupes() {
        let resolved = AnyExpansion::default().resolve(&[Verb::Get, Verb::Any, Verb::Delete]);
        assert_eq!(resolved[0], Verb::Get);
        assert_eq!(resolved.iter().filter(|v| **v == Verb::Get).count(), 1);
        assert!(resolved.contains(&Verb::Delete));
    }
}
