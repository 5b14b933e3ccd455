//! Backend accessors: one call per function, typed inputs, normalized outputs.

pub mod auth;
pub mod client;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod resource;
pub mod reviews;
pub mod vouchers;

pub use client::ApiClient;
