pub mod board;
pub mod config;
pub mod placement;
pub mod template;

pub use board::*;
pub use config::*;
pub use placement::*;
pub use template::*;
