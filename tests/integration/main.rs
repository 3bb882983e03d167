//! Integration test harness.

mod simulation;
