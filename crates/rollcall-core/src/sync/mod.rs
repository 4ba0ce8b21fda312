//! Cloud reconciliation layer.
//!
//! The remote store holds three shared JSON documents (timetable,
//! attendance, rep pins). Local stores push full snapshots after each
//! change; startup pulls merge remote state back in.

pub mod document_client;
pub mod reconciler;
pub mod types;

#[cfg(test)]
mod reconciler_tests;

pub use document_client::DocumentClient;
pub use reconciler::{merge_attendance, SyncReconciler};
pub use types::{attendance_key, SyncError, SyncSink, SyncTopic};
