use serde_json::json;

use crate::Result;
use crate::ops;
use crate::repo::Workspace;

use super::super::{emit, render, Ctx};

pub(crate) fn handle(ctx: &Ctx, src_path: &str, dst_path: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx.require_src()?, &ctx.dst)?;
    let outcome = ops::object::run(&ws, src_path, dst_path)?;
    let value = json!({
        "copied": outcome.copied,
        "commit": outcome.commit.map(|oid| oid.to_string()),
    });
    emit(&value, render::render_track(&outcome), ctx.json)
}
