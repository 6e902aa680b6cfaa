pub mod client;
pub mod consumer;
pub mod reading_processor;

pub use client::*;
pub use consumer::*;
pub use reading_processor::*;
