pub mod inventory;
pub mod samples;
