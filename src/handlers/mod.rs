// src/handlers/mod.rs
pub mod countries;
pub mod error;
pub mod events;
pub mod intraday;
