//! Crate-level behavioural tests and shared test helpers.

mod behaviour;
pub(crate) mod support;
