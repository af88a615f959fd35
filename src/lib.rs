//! Remote approval gating for AI coding assistant tool calls.
//!
//! An MCP stdio server holds each gated tool call in a suspended state until
//! a human approves or denies it over a localhost HTTP surface, or a timeout
//! denies it. Lifecycle events are surfaced to Slack when configured.

pub mod approval;
pub mod cli;
pub mod config;
pub mod decision;
pub mod error;
pub mod http;
pub mod mcp;
pub mod notify;
pub mod session;
