pub mod bindings;
pub mod config;
