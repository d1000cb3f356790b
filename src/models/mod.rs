pub mod user;
pub mod tally;

pub use user::*;
pub use tally::*;
