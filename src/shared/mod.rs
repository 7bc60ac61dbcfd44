pub mod errors;
pub mod notify;
pub mod paths;
