//! Observable primitives: `Property<T>` (value cell with change notification)
//! and `Signal<T>` (multicast emission channel), both with scoped
//! subscription handles that detach on drop.

mod property;
mod signal;
mod subscription;

pub use property::Property;
pub use signal::Signal;
pub use subscription::Subscription;
