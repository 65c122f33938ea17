pub mod extensions;
pub mod sniff;
pub mod validator;

pub use extensions::AllowedExtensions;
pub use sniff::sniff;
pub use validator::{validate, ContentMismatch};
