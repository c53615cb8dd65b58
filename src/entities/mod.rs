//! Helpers for declaring resource types

mod macros;

pub(crate) use macros::impl_resource;
