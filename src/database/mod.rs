pub mod assignment;
pub mod auth;
pub mod course;
pub mod image;
pub mod postgres_repository;
pub mod session;
