use crate::Result;
use crate::repo::Workspace;
use crate::sync::{self, SyncError};

use super::super::{emit, render, Ctx};

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let ws = Workspace::open(ctx.require_src()?, &ctx.dst)?;
    let report = sync::update::run(&ws)?;
    let conflicts = report.conflicts.len();
    emit(&report, render::render_update(&report), ctx.json)?;
    // Report is printed either way; a conflicted run still exits
    // non-zero so scripts notice.
    if conflicts > 0 {
        return Err(SyncError::Conflicts(conflicts).into());
    }
    Ok(())
}
