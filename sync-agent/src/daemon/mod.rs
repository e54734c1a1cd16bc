//! Process lifecycle helpers.

pub mod shutdown;
