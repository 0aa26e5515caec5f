//! Wire types exchanged with HTTP clients.

pub mod v1;
