// src/models/mod.rs

pub mod blog;
pub mod comment;
pub mod notification;
pub mod user;
