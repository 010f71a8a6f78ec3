//! Append-only JSONL activity logging for verification runs.

pub mod jsonl;
