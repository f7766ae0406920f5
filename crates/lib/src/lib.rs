//! Biva core library: inbound normalization, intent pipeline, delivery, and the webhook gateway
//! used by the CLI.

pub mod backend;
pub mod channels;
pub mod config;
pub mod dispatch;
pub mod format;
pub mod gateway;
pub mod init;
pub mod intent;
pub mod pipeline;
