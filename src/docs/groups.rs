use crate::registry::{Endpoint, Registry};

/// Endpoints sharing a `(version, group)` pair.
#[derive(Debug)]
pub struct DocGroup<'a> {
    pub title: String,
    pub version: &'a str,
    pub group: &'a str,
    pub endpoints: Vec<&'a Endpoint>,
}

/// `"test v1"` -> `"Test V1"`; the empty pair is titled `"Domain"`.
#[must_use]
pub fn group_title(group: &str, version: &str) -> String {
    if group.is_empty() && version.is_empty() {
        return "Domain".to_string();
    }
    format!("{group} {version}")
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Group the registry for documentation.
///
/// Groups are ordered by `(version, group)` and endpoints inside a group by
/// `(name, full_path)`, so repeated runs produce identical output.
#[must_use]
pub fn group_endpoints(registry: &Registry) -> Vec<DocGroup<'_>> {
    let mut groups: Vec<DocGroup<'_>> = Vec::new();
    for ep in registry.list() {
        match groups
            .iter_mut()
            .find(|g| g.version == ep.version && g.group == ep.group)
        {
            Some(g) => g.endpoints.push(ep),
            None => groups.push(DocGroup {
                title: group_title(&ep.group, &ep.version),
                version: &ep.version,
                group: &ep.group,
                endpoints: vec![ep],
            }),
        }
    }
    groups.sort_by(|a, b| (a.version, a.group).cmp(&(b.version, b.group)));
    for g in &mut groups {
        g.endpoints
            .sort_by(|a, b| (&a.name, a.full_path()).cmp(&(&b.name, b.full_path())));
    }
    groups
}
