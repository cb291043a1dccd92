pub mod core;
pub mod grading;
pub mod history;
pub mod profiles;
