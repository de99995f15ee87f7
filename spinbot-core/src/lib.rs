// src/lib.rs

pub mod api;
pub mod eventbus;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod test_utils;
pub mod utils;

pub use spinbot_common::error::Error;
