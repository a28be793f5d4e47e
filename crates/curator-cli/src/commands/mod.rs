//! Command handlers grouped by concern.

pub(crate) mod actions;
pub(crate) mod inspect;
pub(crate) mod list;
pub(crate) mod watch;
