pub mod params;
pub mod screener;

#[cfg(test)]
mod tests;

pub use params::*;
pub use screener::*;
