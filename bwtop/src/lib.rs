//! Library surface for the bwtop client: the sample window, unit scaling,
//! chart rendering and poll scheduling used by the binary and its tests.

pub mod buffer;
pub mod chart;
pub mod fetch;
pub mod profiles;
pub mod scale;
pub mod scheduler;
pub mod ui;
pub mod widget;
