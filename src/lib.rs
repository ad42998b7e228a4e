//! loadplan: command-line and web front end for a cargo-loading optimization
//! backend.
//!
//! The backend owns every loading decision. This crate talks to it
//! ([`api`]), turns its result documents into dashboard views ([`present`]),
//! keeps the operator's session ([`dashboard`]) and records a local run
//! history ([`history`]).

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod history;
pub mod model;
pub mod present;
pub mod web;
