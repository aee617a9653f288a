//! Radix tree over path segments.
//!
//! - Static segments (e.g., `users`) match exactly
//! - Parameter segments (e.g., `{id}`) match any single segment
//! - A tail segment (e.g., `{*file}`) matches one or more remaining segments
//! - Parameter values are percent-decoded
//! - Routes are stored at terminal nodes, keyed by HTTP method
//!
//! Static children are tried before parameter children, so `/users/me` wins
//! over `/users/{id}` for the request `/users/me`.

use http::Method;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::ParamVec;

/// Split a path into its non-empty segments.
pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.starts_with('*'))
}

fn tail_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix("{*")
        .and_then(|s| s.strip_suffix('}'))
}

/// Percent-decode one path segment; undecodable input is kept as sent.
fn decode(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(value) => value.into_owned(),
        Err(_) => segment.to_string(),
    }
}

pub(crate) struct RadixNode<T> {
    segment: Cow<'static, str>,
    routes: HashMap<Method, Arc<T>>,
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode<T>>,
    /// One child per distinct parameter name at this depth
    param_children: Vec<RadixNode<T>>,
    /// Tail children take every remaining segment; always leaves
    tail_children: Vec<RadixNode<T>>,
}

impl<T> RadixNode<T> {
    pub(crate) fn root() -> Self {
        Self::new(Cow::Borrowed(""))
    }

    fn new(segment: Cow<'static, str>) -> Self {
        Self {
            segment,
            routes: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
            tail_children: Vec::new(),
        }
    }

    fn new_param(name: &str) -> Self {
        let mut node = Self::new(Cow::Borrowed(""));
        node.param_name = Some(Arc::from(name));
        node
    }

    /// Insert a route, returning `false` when the node already has one for `method`.
    pub(crate) fn insert(&mut self, segments: &[&str], method: Method, route: Arc<T>) -> bool {
        let Some((segment, remaining)) = segments.split_first() else {
            if self.routes.contains_key(&method) {
                return false;
            }
            self.routes.insert(method, route);
            return true;
        };

        if let Some(name) = tail_name(segment) {
            let child = match self
                .tail_children
                .iter()
                .position(|c| c.param_name.as_deref() == Some(name))
            {
                Some(i) => &mut self.tail_children[i],
                None => {
                    self.tail_children.push(RadixNode::new_param(name));
                    let last = self.tail_children.len() - 1;
                    &mut self.tail_children[last]
                }
            };
            return child.insert(&[], method, route);
        }

        if let Some(name) = param_name(segment) {
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param_name.as_deref() == Some(name))
            {
                return child.insert(remaining, method, route);
            }
            let mut child = RadixNode::new_param(name);
            let inserted = child.insert(remaining, method, route);
            self.param_children.push(child);
            return inserted;
        }

        if let Some(child) = self.children.iter_mut().find(|c| c.segment == *segment) {
            return child.insert(remaining, method, route);
        }
        let mut child = RadixNode::new(Cow::Owned((*segment).to_string()));
        let inserted = child.insert(remaining, method, route);
        self.children.push(child);
        inserted
    }

    pub(crate) fn search(
        &self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
    ) -> Option<Arc<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.routes.get(method).cloned();
        };

        for child in &self.children {
            if child.segment == *segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        for child in &self.param_children {
            if let Some(name) = &child.param_name {
                params.push((Arc::clone(name), decode(segment)));
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
                params.pop();
            }
        }

        for child in &self.tail_children {
            if let (Some(name), Some(route)) = (&child.param_name, child.routes.get(method)) {
                let rest: Vec<String> = segments.iter().map(|s| decode(s)).collect();
                params.push((Arc::clone(name), rest.join("/")));
                return Some(Arc::clone(route));
            }
        }

        None
    }

    /// True when some node matching `segments` has at least one method bound.
    pub(crate) fn has_any_method(&self, segments: &[&str]) -> bool {
        let Some((segment, remaining)) = segments.split_first() else {
            return !self.routes.is_empty();
        };
        self.children
            .iter()
            .filter(|c| c.segment == *segment)
            .chain(self.param_children.iter())
            .any(|c| c.has_any_method(remaining))
            || self.tail_children.iter().any(|c| !c.routes.is_empty())
    }
}

/// Shape of a pattern with every placeholder erased: `/a/{id}` and `/a/{x}` share `/a/{}`.
pub(crate) fn shape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for s in segments(pattern) {
        out.push('/');
        if tail_name(s).is_some() {
            out.push_str("{*}");
        } else if param_name(s).is_some() {
            out.push_str("{}");
        } else {
            out.push_str(s);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
