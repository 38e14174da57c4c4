// src/controllers/mod.rs

pub mod auth_controller;
pub mod message_controller;
pub mod suggest_controller;
