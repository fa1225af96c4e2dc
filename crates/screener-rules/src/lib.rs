pub mod indicators;
pub mod rules;


pub use indicators::*;
pub use rules::*;
