//! Focuswire core library
//!
//! Contains the window event type, the call-argument projection and the
//! configuration model. This crate has no knowledge of any display server
//! or bus transport.

pub mod config;
pub mod event;

pub use config::{Backend, Config, ConfigError, ListenerConfig, WatcherConfig};
pub use event::{compose_app_id, CallArgs, Field, WindowEvent};
