// src/services/mod.rs

pub mod auth_service;
pub mod mail_service;
pub mod memory_store;
pub mod mongo_store;
pub mod suggestion_service;
pub mod user_store;
