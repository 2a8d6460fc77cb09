pub mod achievements;
pub mod filter;
pub mod reality;
pub mod task;
pub mod view;
