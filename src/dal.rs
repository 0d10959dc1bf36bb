pub mod rides;

pub use rides::*;
