//! Subdomain-router - a reverse proxy that routes by subdomain
//!
//! This library provides a minimal HTTP reverse proxy that:
//! - Routes traffic to local backend ports based on the subdomain of the
//!   request's Host header
//! - Streams request and response bodies without buffering them
//! - Falls back to a catch-all port for unmapped subdomains, if configured
//! - Answers directly with plain-text messages for the home page, unknown
//!   subdomains, and backends that are down or misbehaving

pub mod config;
pub mod forward;
pub mod proxy;
pub mod response;
pub mod router;
