use askama::Template;
use serde_json::Value;

use super::groups::group_endpoints;
use super::DocsInfo;
use crate::registry::{Endpoint, Param, Registry};

struct ParamRow {
    name: String,
    required: &'static str,
    description: String,
}

impl ParamRow {
    fn from_param(p: &Param, always_required: bool) -> Self {
        Self {
            name: p.name.clone(),
            required: if always_required || p.required { "yes" } else { "no" },
            description: p.description.clone(),
        }
    }
}

struct EndpointSection {
    name: String,
    methods: String,
    path: String,
    description: String,
    path_params: Vec<ParamRow>,
    query_params: Vec<ParamRow>,
    json_fields: Vec<ParamRow>,
    request_content_type: String,
    response_content_type: String,
    request_example: String,
    response_example: String,
}

struct GroupSection {
    title: String,
    endpoints: Vec<EndpointSection>,
}

#[derive(Template)]
#[template(path = "api_docs.md", escape = "none")]
struct ApiDocsTemplate<'a> {
    info: &'a DocsInfo,
    groups: Vec<GroupSection>,
}

fn example_text(example: Option<&Value>, pretty: bool) -> String {
    let rendered = match example {
        Some(v) if pretty => serde_json::to_string_pretty(v),
        Some(v) => serde_json::to_string(v),
        None => return String::new(),
    };
    rendered.unwrap_or_default()
}

fn section(ep: &Endpoint, registry: &Registry) -> EndpointSection {
    let methods = registry
        .any_expansion()
        .resolve(&ep.methods)
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    EndpointSection {
        name: if ep.name.is_empty() {
            ep.full_path().to_string()
        } else {
            ep.name.clone()
        },
        methods,
        path: ep.full_path().to_string(),
        description: ep.description.clone(),
        path_params: ep.path_params.iter().map(|p| ParamRow::from_param(p, true)).collect(),
        query_params: ep.query_params.iter().map(|p| ParamRow::from_param(p, false)).collect(),
        json_fields: ep.json_fields.iter().map(|p| ParamRow::from_param(p, false)).collect(),
        request_content_type: ep.request_content_type.clone(),
        response_content_type: ep.response_content_type.clone(),
        request_example: example_text(ep.request_body_example.as_ref(), ep.pretty_output),
        response_example: example_text(ep.response_body_example.as_ref(), ep.pretty_output),
    }
}

/// Render the Slate-style Markdown page for every registered endpoint.
///
/// # Errors
///
/// Template rendering failure.
pub fn render_markdown(registry: &Registry, info: &DocsInfo) -> Result<String, askama::Error> {
    let groups = group_endpoints(registry)
        .into_iter()
        .map(|g| GroupSection {
            title: g.title,
            endpoints: g.endpoints.iter().map(|ep| section(ep, registry)).collect(),
        })
        .collect();
    ApiDocsTemplate { info, groups }.render()
}
