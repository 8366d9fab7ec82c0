//! Integration tests for whisper-client against an in-process fake node.
//!
//! Run with: cargo test -p whisper-client --test integration

mod reader;
mod transport;
