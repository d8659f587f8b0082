use serde_json::json;

use crate::Result;
use crate::ops;
use crate::repo::Workspace;

use super::super::{emit, render, Ctx};

pub(crate) fn handle(ctx: &Ctx, old: &str, new: &str) -> Result<()> {
    let ws = Workspace::open(ctx.require_src()?, &ctx.dst)?;
    let commit = ops::rename::run(&ws, old, new)?;
    let value = json!({
        "old": old,
        "new": new,
        "commit": commit.to_string(),
    });
    emit(&value, render::render_rename(old, new, commit), ctx.json)
}
