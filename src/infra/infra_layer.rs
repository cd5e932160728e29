// The infra module contains implementations of core traits and other
// non-Discord plumbing.

#[path = "requests/mod.rs"]
pub mod requests;

#[path = "health/liveness.rs"]
pub mod health;
