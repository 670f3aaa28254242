//! Project Workflow - progression and alert engine for project templates
//!
//! Tracks each project's position in a phase → section → line item
//! workflow, derives its display phase and progress, and keeps exactly one
//! active alert per currently actionable line item.
//!
//! - `domain` - templates, trackers, the progression engine, alerts, display labels
//! - `ports` - storage and delivery interfaces
//! - `adapters` - in-memory and PostgreSQL ports, the healing sweep
//! - `application` - handlers for the exposed operations
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
