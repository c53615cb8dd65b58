//! API exposure
//!
//! An exposure consumes a `ServerHost` and produces a Router for one protocol.

pub mod rest;

pub use rest::RestExposure;
