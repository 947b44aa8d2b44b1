mod device_address;

pub use device_address::resolve_device_address;
