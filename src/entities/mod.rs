pub mod device;

pub use device::Availability;
