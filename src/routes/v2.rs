use serde::Serialize;

use crate::dispatcher::HandlerResult;
use crate::registry::{Endpoint, Param};
use crate::server::{RequestContext, ResponseWriter};

#[derive(Debug, Serialize)]
struct Echo<'a> {
    word: &'a str,
}

pub fn endpoints() -> Vec<Endpoint> {
    vec![Endpoint::new("/echo/{word}", echo)
        .name("Echo")
        .version("v2")
        .group("test")
        .description("Echoes the word given in the path.")
        .path_param(Param::new("word", "any single path segment"))
        .response_example(&Echo { word: "hello" })]
}

fn echo(ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
    let word = ctx.path_param("word").unwrap_or_default();
    res.json(200, &Echo { word })?;
    Ok(())
}
