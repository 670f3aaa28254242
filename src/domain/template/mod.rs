//! Template module - workflow hierarchy definitions and their canonical ordering.
//!
//! A WorkflowTemplate is the ordered Phase → Section → Line Item hierarchy for
//! one workflow type. Its FlattenedSequence is the single total order the
//! engine uses for "next item" lookups and the progress denominator.

mod definition;
mod sequence;

pub use definition::{LineItem, LineItemLocation, Phase, Section, WorkflowTemplate};
pub use sequence::{FlattenedSequence, SequenceEntry, WorkflowPosition};
