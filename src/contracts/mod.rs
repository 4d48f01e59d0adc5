pub mod unity_token;

pub use unity_token::*;
