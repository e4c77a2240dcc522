//! HTTP handlers for the gateway API

pub mod channels;
pub mod devices;
pub mod reduced;
pub mod streams;
