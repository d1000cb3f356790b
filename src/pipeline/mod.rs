pub mod driver;

pub use driver::{Pipeline, RunReport};
