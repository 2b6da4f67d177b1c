//! Hardware Abstraction Layer
//!
//! The bus capability the protocol layers are written against, and its
//! binding to `embedded-hal` peripherals.

pub mod transport;
