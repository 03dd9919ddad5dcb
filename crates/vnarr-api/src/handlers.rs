//! Request handlers.

pub mod frames;
pub mod health;
pub mod models;
pub mod speech;
pub mod videos;

pub use frames::*;
pub use health::*;
pub use models::*;
pub use speech::*;
pub use videos::*;
