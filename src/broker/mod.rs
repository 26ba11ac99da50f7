pub mod client;
pub mod http;

pub use client::*;
pub use http::*;
