//! Reference-counted shared ownership of opaque resource handles.
//!
//! This crate provides [`SharedHandle<T>`], a shared-ownership wrapper around an opaque
//! resource identifier (an integer id, native pointer, index, ...) whose actual teardown
//! is performed by a caller-supplied deleter. It guarantees that the resource is destroyed
//! exactly once, exactly when the last handle referencing it is released, and that a
//! resource declared to depend on a parent resource is always destroyed strictly before
//! the parent's own teardown can happen.
//!
//! # Key Features
//!
//! - **Exactly-once teardown**: the deleter runs once, at last-reference release
//! - **Parent-before-child safety**: child handles keep their parent alive and are torn
//!   down first, cascading correctly through arbitrarily long dependency chains
//! - **Compile-time shapes**: whether a resource type has a parent is declared via
//!   [`Resource::Control`]; parent accessors simply do not exist on parentless handles
//! - **Injected deleters**: teardown logic is supplied per control block via the
//!   [`Destroy`] / [`DestroyWithParent`] capabilities, including plain closures
//! - **Factory-friendly slots**: [`SharedHandle::put()`] re-arms a handle and hands back
//!   a mutable slot for an external factory call to fill
//! - **Atomic reference counting**: handles sharing a control block may be read, cloned,
//!   and dropped from multiple threads
//!
//! # Ownership model
//!
//! Every live handle references a heap-allocated control block holding the deleter and,
//! for child resource types, an owning [`SharedHandle`] to the parent. Cloning a handle
//! shares the control block. Releasing a handle (drop, [`reset()`](SharedHandle::reset),
//! overwrite, [`put()`](SharedHandle::put)) checks whether it was the sole owner; only
//! then does the deleter run, strictly before the control block (and with it the owned
//! parent reference) is released.
//!
//! Mutating one handle instance from several threads concurrently is not supported; see
//! the thread safety notes on [`SharedHandle`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Mutex;
//!
//! use shared_handle::{ChildControl, Resource, RootControl, SharedHandle};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq)]
//! struct DeviceId(u64);
//!
//! impl Resource for DeviceId {
//!     type Control = RootControl<fn(DeviceId)>;
//!
//!     const NULL: Self = DeviceId(0);
//! }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq)]
//! struct BufferId(u64);
//!
//! impl Resource for BufferId {
//!     type Control = ChildControl<DeviceId, fn(DeviceId, BufferId)>;
//!
//!     const NULL: Self = BufferId(0);
//! }
//!
//! static TEARDOWN: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
//!
//! fn destroy_device(_device: DeviceId) {
//!     TEARDOWN.lock().unwrap().push("device");
//! }
//!
//! fn destroy_buffer(_device: DeviceId, _buffer: BufferId) {
//!     TEARDOWN.lock().unwrap().push("buffer");
//! }
//!
//! let device = SharedHandle::new(DeviceId(1), destroy_device);
//! let buffer = SharedHandle::with_parent(BufferId(42), device.clone(), destroy_buffer);
//!
//! // Dropping our device handle does not tear the device down; the buffer
//! // still owns a reference to it through its control block.
//! drop(device);
//! assert!(TEARDOWN.lock().unwrap().is_empty());
//!
//! // Dropping the buffer tears down the buffer first, then cascades to the device.
//! drop(buffer);
//! assert_eq!(*TEARDOWN.lock().unwrap(), vec!["buffer", "device"]);
//! ```

mod control;
mod convert;
mod deleter;
mod handle;
mod resource;

pub use control::*;
pub use convert::*;
pub use deleter::*;
pub use handle::*;
pub use resource::*;
