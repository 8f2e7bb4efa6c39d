//! Address, range and local-interface models used to build a discovery scan.

pub mod address;
pub mod interface;
pub mod range;
pub mod space;
