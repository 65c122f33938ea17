pub mod engine;
pub mod local;
pub mod object;

pub use engine::*;
pub use local::LocalStorage;
pub use object::*;
