//! Entity and column-mapping vocabulary shared by the criteria builder and
//! its metadata providers.

pub mod core;
pub mod metadata;

mod macros;
