pub mod cors;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use server::{build_router, serve};

pub type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;
