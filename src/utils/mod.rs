pub mod io;
pub mod limits;
pub mod names;
