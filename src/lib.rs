//! tasmik: a REST backend for Quran-memorization assessment participants,
//! assessors, and reference geography data.
//!
//! The interesting subsystem is [`cache`] (read-through response caching)
//! together with [`application::query`] (the generic list-query translator
//! that turns declarative filter/sort/paginate parameters into a
//! [`application::query::QueryDescriptor`] for a data source).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
