pub mod error;
pub mod fanout;
pub mod handle;
pub mod logs;
pub mod remote;
pub mod tool;

pub use error::*;
pub use fanout::*;
pub use handle::*;
pub use logs::*;
pub use tool::*;

#[cfg(test)]
pub(crate) mod testing;
