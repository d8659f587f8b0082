mod object;
mod rename;
mod status;
