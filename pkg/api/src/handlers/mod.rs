pub mod admission;
pub mod health;
