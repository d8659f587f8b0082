use crate::Result;
use crate::ops;
use crate::repo;

use super::super::{emit, render, Ctx};

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let dst = repo::open(&ctx.dst)?;
    let report = ops::status::run(&dst)?;
    emit(&report, render::render_status(&report), ctx.json)
}
