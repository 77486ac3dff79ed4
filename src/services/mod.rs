// src/services/mod.rs
pub mod calculations;
pub mod countries;
pub mod filter;
pub mod store;
