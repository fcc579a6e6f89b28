mod admission;
mod builder;
mod core;
mod handle;
mod pending;
mod slot;

pub use builder::ThrottleBuilder;
pub use self::core::Throttle;
pub use handle::CallHandle;
