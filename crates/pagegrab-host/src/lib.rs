//! Host side of pagegrab: the router socket server and its client.

pub mod socket;
