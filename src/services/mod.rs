pub mod archive;
pub mod auth;
pub mod dashboard;
pub mod filter;
pub mod label;
