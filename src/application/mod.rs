//! Application services layer.

pub mod error;
pub mod identity;
pub mod repos;
pub mod tags;
