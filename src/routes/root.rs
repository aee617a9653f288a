use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::dispatcher::HandlerResult;
use crate::error::{ApiError, ResponseBody};
use crate::registry::{Endpoint, Param, Verb};
use crate::server::{RequestContext, ResponseWriter};
use crate::version::Home;

/// Body accepted and echoed by `POST /testing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostTest {
    pub id: i64,
    pub name: String,
    pub float: f64,
    #[serde(default)]
    pub map: Map<String, Value>,
    #[serde(default)]
    pub array: Vec<Value>,
}

impl PostTest {
    fn example() -> Self {
        let mut map = Map::new();
        map.insert("test".to_string(), json!("value"));
        map.insert("test2".to_string(), json!(432));
        Self {
            id: 123,
            name: "Alex Doe".to_string(),
            float: 123.456,
            map,
            array: vec![
                json!("string value"),
                json!(123.12),
                json!({ "key": "value" }),
                json!(6575),
            ],
        }
    }
}

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::new("/", root)
            .name("Root Path")
            .description("The root path returns the api name and version.")
            .methods([Verb::Any])
            .response_example(&Home::current())
            .pretty(true),
        Endpoint::new("/error", error)
            .name("Error Path")
            .description("This route returns an error depending on given id (none, 1, or 2)")
            .query_param(Param::new("id", "use none, 1 or 2 for different errors"))
            .response_example(&ResponseBody {
                message: "you have made a bad request".to_string(),
                code: 400,
                status: "Bad Request".to_string(),
            }),
        Endpoint::new("/testing", testing)
            .name("Testing Post Route")
            .description("This is for testing post requests")
            .methods([Verb::Post])
            .request_example(&PostTest::example())
            .response_example(&PostTest::example())
            .json_fields([
                Param::new("id", "numeric identifier").required(),
                Param::new("name", "display name").required(),
                Param::new("float", "any floating point value").required(),
                Param::new("map", "free-form object"),
                Param::new("array", "free-form list"),
            ])
            .pretty(true),
    ]
}

fn root(_ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    res.json_pretty(200, &Home::current())?;
    Ok(())
}

fn error(ctx: &mut RequestContext, _res: &mut ResponseWriter) -> HandlerResult {
    match ctx.query_param("id") {
        Some("1") => Err(ApiError::new(
            "internal message number 1",
            "you have made a bad request",
            400,
            Some(anyhow!("internal error 1")),
        )
        .into()),
        Some("2") => Err(ApiError::new(
            "internal message number 2",
            "this is not acceptable",
            406,
            Some(anyhow!("internal error 2")),
        )
        .into()),
        _ => Err(anyhow!("an error has occurred")),
    }
}

fn testing(ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    let body: PostTest = ctx.json_body().map_err(|e| {
        ApiError::new(
            "error decoding request body",
            "could not decode request body",
            400,
            Some(e.into()),
        )
    })?;
    res.json_pretty(200, &body)?;
    Ok(())
}
