pub mod api;
pub mod config;
pub mod engine;
pub mod export;
pub mod layout;
pub mod model;
pub mod resize;
pub mod style;
pub mod util;
