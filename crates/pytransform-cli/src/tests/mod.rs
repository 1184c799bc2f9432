//! Crate-level tests: shared doubles, in-process CLI runs and behaviour
//! scenarios.

mod behaviour;
pub(crate) mod support;
