pub mod catalog_ops;
pub mod factory;
pub mod move_ops;
pub mod resolve;
pub mod session;
