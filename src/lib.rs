#![doc = "The `taskline` library crate."]
#![doc = ""]
#![doc = "Authentication core of the Taskline API: credential hashing, JWT issuance,"]
#![doc = "refresh-token rotation and revocation, plus the actix-web routes and middleware"]
#![doc = "that expose them. The binary (`main.rs`) wires it to Postgres and serves it."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;

pub use crate::error::AppError;
