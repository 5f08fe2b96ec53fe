pub mod error;
pub mod health;
pub mod ide;
pub mod image;
