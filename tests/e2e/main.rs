//! E2E test suite entry point.

mod apply_workflow;
mod fixture;
mod plan_workflow;
