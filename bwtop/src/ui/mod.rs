//! UI module root: exposes drawing functions for individual panels.

pub mod header;
pub mod status;
pub mod util;
