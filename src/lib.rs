//! ccron - audits construction schedule exports
//!
//! A schedule export is a flat, ordered list of rows forming a work
//! breakdown structure. ccron normalizes the rows, derives hierarchical
//! location codes and service codings, then checks the result: overlapping
//! or widely spaced occurrences of a service, predecessor relations that
//! drift from a reference macro-flow, and a set of row-level fill rules.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{AuditReport, Auditor, Task, TaskId, TransformPipeline};
