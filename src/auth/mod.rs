pub mod jwt;
pub mod password;

pub mod auth_dto;
pub mod auth_handlers;
pub mod auth_models;
pub mod auth_repository;
pub mod auth_service;

pub use jwt::{create_jwt, verify_jwt};
pub use password::{hash_password, verify_password};
