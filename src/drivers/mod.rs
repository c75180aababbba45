pub mod device_link;
pub mod host_link;
pub mod target;

pub use device_link::{Completion, DeviceLink, DeviceShared, FILLER};
pub use host_link::{HostLink, HostShared};
pub use target::{Target, ENABLE_ACK};
