//! Centralized constants for the ultron webhook.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod algorithm;
pub mod cache;
pub mod k8s;
pub mod network;
pub mod paths;
pub mod workload;
