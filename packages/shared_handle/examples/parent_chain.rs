//! A two-level parent/child chain: buffers that must not outlive their device.
//!
//! Demonstrates that dropping every external reference to the parent does not
//! tear it down while children exist, and that teardown cascades leaf-first.

use shared_handle::{ChildControl, Resource, RootControl, SharedHandle, raw_handles};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DeviceId(u64);

impl Resource for DeviceId {
    type Control = RootControl<fn(DeviceId)>;

    const NULL: Self = DeviceId(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BufferId(u64);

impl Resource for BufferId {
    type Control = ChildControl<DeviceId, fn(DeviceId, BufferId)>;

    const NULL: Self = BufferId(0);
}

fn destroy_device(device: DeviceId) {
    println!("destroying device {}", device.0);
}

fn destroy_buffer(device: DeviceId, buffer: BufferId) {
    println!("destroying buffer {} on device {}", buffer.0, device.0);
}

fn main() {
    let device = SharedHandle::new(DeviceId(1), destroy_device);

    let buffers: Vec<_> = (1..=3)
        .map(|i| SharedHandle::with_parent(BufferId(i), device.clone(), destroy_buffer))
        .collect();

    // An external API call wants the raw values, in order.
    println!("raw buffer values: {:?}", raw_handles(&buffers));

    // Children resolve their parent without holding an external device handle.
    if let Some(buffer) = buffers.first() {
        println!("buffers belong to device {}", buffer.parent().0);
    }

    // The device handle goes away first, but the device itself survives:
    // every buffer's control block still owns a reference to it.
    drop(device);
    println!("external device reference dropped; buffers still usable");

    // Dropping the last buffer destroys it and then cascades to the device.
    drop(buffers);
    println!("done");
}
