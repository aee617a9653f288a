use serde_json::{json, Map, Value};

use super::groups::group_endpoints;
use super::DocsInfo;
use crate::registry::{Endpoint, Param, Registry, Verb};

/// Build an OpenAPI 3.1 document describing every registered endpoint.
///
/// `Any` is listed under the concrete methods it expands to. `CONNECT` has no
/// OpenAPI operation slot and is left out.
#[must_use]
pub fn openapi_document(registry: &Registry, info: &DocsInfo) -> Value {
    let groups = group_endpoints(registry);
    let tags: Vec<Value> = groups
        .iter()
        .map(|g| json!({ "name": g.title }))
        .collect();

    let mut paths = Map::new();
    for group in &groups {
        for ep in &group.endpoints {
            let item = paths
                .entry(openapi_path(ep.full_path()))
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(item) = item else { continue };
            for verb in registry.any_expansion().resolve(&ep.methods) {
                if verb == Verb::Connect {
                    continue;
                }
                let method = verb.as_str().to_ascii_lowercase();
                item.insert(method.clone(), operation(ep, &method, &group.title));
            }
        }
    }

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": info.title,
            "version": info.version,
            "description": info.description,
        },
        "tags": tags,
        "paths": paths,
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "required": ["message", "code", "status"],
                    "properties": {
                        "message": { "type": "string" },
                        "code": { "type": "integer" },
                        "status": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// OpenAPI has no tail placeholder; `{*file}` is documented as `{file}`.
fn openapi_path(full_path: &str) -> String {
    full_path.replace("{*", "{")
}

/// `get_root_path` style identifier, unique per (method, endpoint).
fn operation_id(ep: &Endpoint, method: &str) -> String {
    let source = if ep.name.is_empty() {
        ep.full_path()
    } else {
        ep.name.as_str()
    };
    let mut id = String::from(method);
    for word in source
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        id.push('_');
        id.push_str(&word.to_ascii_lowercase());
    }
    if id == method {
        id.push_str("_root");
    }
    id
}

fn parameter(p: &Param, location: &str) -> Value {
    json!({
        "name": p.name,
        "in": location,
        "description": p.description,
        "required": location == "path" || p.required,
        "schema": { "type": "string" }
    })
}

fn content(content_type: &str, example: Option<&Value>) -> Value {
    let mut media = Map::new();
    if let Some(example) = example {
        media.insert("example".to_string(), example.clone());
    }
    let mut content = Map::new();
    content.insert(content_type.to_string(), Value::Object(media));
    Value::Object(content)
}

fn operation(ep: &Endpoint, method: &str, tag: &str) -> Value {
    let parameters: Vec<Value> = ep
        .path_params
        .iter()
        .map(|p| parameter(p, "path"))
        .chain(ep.query_params.iter().map(|p| parameter(p, "query")))
        .collect();

    let summary = if ep.name.is_empty() {
        ep.full_path()
    } else {
        ep.name.as_str()
    };
    let mut op = json!({
        "operationId": operation_id(ep, method),
        "summary": summary,
        "description": ep.description,
        "tags": [tag],
        "responses": {
            "200": {
                "description": "Successful response",
                "content": content(&ep.response_content_type, ep.response_body_example.as_ref()),
            },
            "default": {
                "description": "Error response",
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            }
        }
    });
    if let Value::Object(map) = &mut op {
        if !parameters.is_empty() {
            map.insert("parameters".to_string(), Value::Array(parameters));
        }
        if ep.request_body_example.is_some() {
            map.insert(
                "requestBody".to_string(),
                json!({
                    "content": content(&ep.request_content_type, ep.request_body_example.as_ref())
                }),
            );
        }
    }
    op
}

/// Check a generated document against the `oas3` model.
///
/// # Errors
///
/// The deserialization error when the document does not fit the OpenAPI schema.
pub fn validate_document(doc: &Value) -> Result<oas3::OpenApiV3Spec, serde_json::Error> {
    serde_json::from_value(doc.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HandlerResult;
    use crate::server::{RequestContext, ResponseWriter};

    fn noop(_ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
        Ok(())
    }

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .register([
                Endpoint::new("/", noop).name("Root Path").methods([Verb::Any]),
                Endpoint::new("/echo/{word}", noop)
                    .name("echo")
                    .version("v2")
                    .group("test")
                    .path_param(Param::new("word", "word to echo"))
                    .query_param(Param::new("loud", "shout it")),
                Endpoint::new("/post", noop)
                    .name("post")
                    .version("v1")
                    .group("test")
                    .methods([Verb::Post])
                    .request_example(&json!({ "id": 1 }))
                    .response_example(&json!({ "id": 1 }))
                    .json_fields([Param::new("id", "identifier")]),
            ])
            .unwrap();
        registry
    }

    #[test]
    fn test_document_is_valid_openapi() {
        let doc = openapi_document(&registry(), &DocsInfo::default());
        assert_eq!(doc["openapi"], "3.1.0");
        let spec = validate_document(&doc).unwrap();
        assert_eq!(spec.info.title, DocsInfo::default().title);
    }

    #[test]
    fn test_any_is_expanded() {
        let doc = openapi_document(&registry(), &DocsInfo::default());
        let root = doc["paths"]["/"].as_object().unwrap();
        assert!(root.contains_key("get"));
        assert!(root.contains_key("trace"));
        assert!(!root.contains_key("head"));
        assert!(!root.contains_key("delete"));
        assert!(!root.contains_key("connect"));
        assert_eq!(root["get"]["operationId"], "get_root_path");
        assert_eq!(root["get"]["tags"][0], "Domain");
    }

    #[test]
    fn test_parameters_and_bodies() {
        let doc = openapi_document(&registry(), &DocsInfo::default());
        let echo = &doc["paths"]["/v2/test/echo/{word}"]["get"];
        assert_eq!(echo["parameters"][0]["in"], "path");
        assert_eq!(echo["parameters"][0]["required"], true);
        assert_eq!(echo["parameters"][1]["in"], "query");
        assert_eq!(echo["parameters"][1]["required"], false);
        assert_eq!(echo["tags"][0], "Test V2");

        let post = &doc["paths"]["/v1/test/post"]["post"];
        assert_eq!(
            post["requestBody"]["content"]["application/json"]["example"]["id"],
            1
        );
        assert_eq!(post["responses"]["200"]["content"]["application/json"]["example"]["id"], 1);
        assert_eq!(
            doc["paths"]["/v1/test/post"]["post"]["responses"]["default"]["content"]
                ["application/json"]["schema"]["$ref"],
            "#/components/schemas/ErrorResponse"
        );
    }

    #[test]
    fn test_tags_follow_groups() {
        let doc = openapi_document(&registry(), &DocsInfo::default());
        let tags: Vec<_> = doc["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(tags, ["Domain", "Test V1", "Test V2"]);
    }
}
