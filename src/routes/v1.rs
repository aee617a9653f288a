use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dispatcher::HandlerResult;
use crate::error::ApiError;
use crate::registry::{Endpoint, Param, Verb};
use crate::server::{RequestContext, ResponseWriter};

const VERSION: &str = "v1";
const GROUP: &str = "test";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostReq {
    pub id: i64,
    pub name: String,
    pub float: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<Vec<serde_json::Value>>,
}

/// Echo of a [`PostReq`]; empty fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostResp {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub field_float: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_map: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<Vec<serde_json::Value>>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

fn is_zero_f64(n: &f64) -> bool {
    *n == 0.0
}

impl From<PostReq> for PostResp {
    fn from(req: PostReq) -> Self {
        Self {
            id: req.id,
            name: req.name,
            field_float: req.float,
            field_map: req.map,
            array: req.array,
        }
    }
}

pub fn endpoints() -> Vec<Endpoint> {
    let example = PostReq {
        id: 1,
        name: "name".to_string(),
        float: 1.5,
        map: Some(BTreeMap::from([("key".to_string(), "value".to_string())])),
        array: Some(vec![serde_json::json!("item")]),
    };
    vec![
        Endpoint::new("/error", test_error)
            .name("Test Error")
            .version(VERSION)
            .group(GROUP)
            .description("return error testing"),
        Endpoint::new("/post", post_test)
            .name("Test Post")
            .version(VERSION)
            .group(GROUP)
            .methods([Verb::Post])
            .description("POST testing endpoint")
            .request_example(&example)
            .response_example(&PostResp::from(example.clone()))
            .json_fields([
                Param::new("id", "numeric identifier").required(),
                Param::new("name", "display name").required(),
                Param::new("float", "any floating point value").required(),
                Param::new("map", "string to string map"),
                Param::new("array", "free-form list"),
            ])
            .pretty(true),
    ]
}

/// Always fails with a structured 400.
fn test_error(_ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
    Err(ApiError::new(
        "internal error message",
        "response body error message",
        400,
        Some(anyhow!("testing 400 error")),
    )
    .into())
}

fn post_test(ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    let req: PostReq = ctx.json_body().map_err(|e| {
        ApiError::new(
            "error decoding request body",
            "could not decode request body",
            400,
            Some(e.into()),
        )
    })?;
    res.json_pretty(200, &PostResp::from(req))?;
    Ok(())
}
