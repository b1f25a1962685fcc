//! Common test utilities

#![allow(dead_code)]

pub mod comfoclime_mock;

pub use comfoclime_mock::MockComfoclime;
