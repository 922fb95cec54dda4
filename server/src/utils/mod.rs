pub mod codes;
pub mod error;
pub mod money;
pub mod response;
