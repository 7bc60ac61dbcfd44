pub mod core;
pub mod shared;
pub mod tasks;

mod app;

pub use app::run;
