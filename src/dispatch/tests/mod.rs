//! Unit tests for dispatch domain rules and services.

mod outbox_relay_tests;
mod support;
