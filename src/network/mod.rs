//! Network-side observation
//!
//! Tracks how densely the client is sending packets to the server. Bursts of
//! outbound packets delay server-side processing of an action, which shows up
//! as an unusually long wait for the authoritative lock.

mod packet_window;

pub use packet_window::PacketWindowTracker;
