// src/guards/mod.rs

pub mod route_guard;
pub mod session;
