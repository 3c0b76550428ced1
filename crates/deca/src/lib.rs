pub mod common;
pub mod config;
pub mod directory;
pub mod error;
pub mod form;
pub mod frame;
pub mod http;
pub mod modal;
pub mod page;
pub mod platform;
pub mod selfserve;
pub mod signin;
pub mod submit;

pub use zoon;
