pub mod gas;
pub mod plan;
pub mod response;
pub mod token;
pub mod units;

pub use gas::*;
pub use plan::*;
pub use response::*;
pub use token::*;
