//! Tests for the seine-stream crate.

mod helpers;

mod blind;
