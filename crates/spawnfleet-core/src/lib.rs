pub mod aggregate;
pub mod error;
pub mod hostfile;
pub mod loader;
pub mod model;
pub mod probe;
pub mod template;

pub use aggregate::*;
pub use error::*;
pub use hostfile::*;
pub use loader::*;
pub use model::*;
pub use probe::*;
pub use template::*;
