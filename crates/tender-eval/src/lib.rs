//! Procurement tender evaluation core.
//!
//! Tracks a tender from the close of bidding through multi-evaluator QCBS
//! scoring to an auditable ranking, and keeps the tender's externally
//! visible status consistent with evaluation progress and downstream
//! no-objection and contracting signals.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
