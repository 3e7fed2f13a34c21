pub mod check;
pub mod claim;
pub mod config;
pub mod serve;
