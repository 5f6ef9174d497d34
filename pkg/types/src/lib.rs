pub mod compute;
pub mod config;
pub mod node;
pub mod pod;
pub mod rate;
