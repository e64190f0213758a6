pub mod engine;
pub mod neighbors;
pub mod table;
pub mod wire;

pub use engine::{Phase, RouterCore};
pub use neighbors::{DistanceVector, NeighborTables};
pub use table::{Cost, RouteEntry, RoutingTable};
pub use wire::Advertisement;

/// Highest update counter a flood message may carry on the wire.
pub const FLOOD_BOUND: u32 = 5;

/// Max datagram size for sending and receiving, in bytes.
pub const BUFFER_SIZE: usize = 4096;
