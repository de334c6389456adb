//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod cms_view;
pub mod der_reader;
pub mod identity;
