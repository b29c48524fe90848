//! Update delivery: long polling or webhook, plus the optional self-ping.

pub mod keepalive;
pub mod polling;
pub mod webhook;
