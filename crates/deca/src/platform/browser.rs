//! DOM bindings of the core components. Everything here runs in the page's
//! single JS thread.

pub mod checkbox;
pub mod directory;
pub mod dom;
pub mod form;
pub mod frame;
pub mod js;
pub mod logger;
pub mod map;
pub mod modal;
pub mod mount;
pub mod page;
pub mod signin;
pub mod transport;

pub use mount::{start, unmount};
