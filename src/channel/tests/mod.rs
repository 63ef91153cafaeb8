//! Test suites for the channel module
//!
//! Organised by behaviour rather than by source file, since most properties
//! involve the channel, its reader and the consumer loops together.

mod helpers;
mod routing;
mod stream;
