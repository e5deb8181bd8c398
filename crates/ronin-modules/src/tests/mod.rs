//! Shared test doubles for the crate's unit tests.

pub(crate) mod support;
