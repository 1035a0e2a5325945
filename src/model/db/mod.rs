pub mod ballot;
pub mod candidate;
pub mod config;
pub mod election;
pub mod member;
