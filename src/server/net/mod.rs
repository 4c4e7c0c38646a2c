pub mod listener;
pub mod port_allocator;

pub use listener::{Accepted, Listener, RejectReason};
pub use port_allocator::PortAllocator;
