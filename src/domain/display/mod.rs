//! Display module - human-readable labels, never engine input.

mod mapper;

pub use mapper::{DisplayLabel, DisplayMapper, LabelSource};
