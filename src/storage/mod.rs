pub mod sqlite;

pub use sqlite::{LocationRow, Storage};
