pub(super) mod object;
pub(super) mod rename;
pub(super) mod status;
pub(super) mod update;
