//! Integration tests for the hotbox repository engine

mod archive_merge;
mod repair_workflow;
mod reorder_workflow;
mod resolution_workflow;
mod test_utils;
