pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod output;
pub mod ranking;
pub mod render;
pub mod selector;
pub mod session;
pub mod tui;
