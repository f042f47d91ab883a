pub mod builder;
pub mod label;
pub mod snap;
pub mod time;
