//! End-to-end lifecycle tests for `shared_handle`.
//!
//! These exercise whole parent/child chains through the public API: teardown
//! ordering, exactly-once destruction across clone/take chains, and the batch
//! raw-value conversion.

use std::cell::RefCell;
use std::num::NonZero;
use std::rc::Rc;

use new_zealand::nz;
use shared_handle::{
    ChildControl, Destroy, DestroyWithParent, Resource, RootControl, SharedHandle, raw_handles,
};

/// Raw identifier as the external system hands them out; `None` means null.
type Id = Option<NonZero<u64>>;

fn raw(id: Id) -> u64 {
    id.map_or(0, NonZero::get)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Instance(Id);

impl Resource for Instance {
    type Control = RootControl<InstanceDeleter>;

    const NULL: Self = Instance(None);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Device(Id);

impl Resource for Device {
    type Control = ChildControl<Instance, DeviceDeleter>;

    const NULL: Self = Device(None);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Buffer(Id);

impl Resource for Buffer {
    type Control = ChildControl<Device, BufferDeleter>;

    const NULL: Self = Buffer(None);
}

/// One teardown call as observed by the fake external system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Teardown {
    Instance(u64),
    Device { instance: u64, device: u64 },
    Buffer { device: u64, buffer: u64 },
}

type Log = Rc<RefCell<Vec<Teardown>>>;

struct InstanceDeleter {
    log: Log,
}

impl Destroy<Instance> for InstanceDeleter {
    fn destroy(&self, handle: Instance) {
        self.log.borrow_mut().push(Teardown::Instance(raw(handle.0)));
    }
}

struct DeviceDeleter {
    log: Log,
}

impl DestroyWithParent<Instance, Device> for DeviceDeleter {
    fn destroy(&self, parent: Instance, handle: Device) {
        self.log.borrow_mut().push(Teardown::Device {
            instance: raw(parent.0),
            device: raw(handle.0),
        });
    }
}

struct BufferDeleter {
    log: Log,
}

impl DestroyWithParent<Device, Buffer> for BufferDeleter {
    fn destroy(&self, parent: Device, handle: Buffer) {
        self.log.borrow_mut().push(Teardown::Buffer {
            device: raw(parent.0),
            buffer: raw(handle.0),
        });
    }
}

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn instance(log: &Log, id: NonZero<u64>) -> SharedHandle<Instance> {
    SharedHandle::new(
        Instance(Some(id)),
        InstanceDeleter {
            log: Rc::clone(log),
        },
    )
}

fn device(log: &Log, parent: SharedHandle<Instance>, id: NonZero<u64>) -> SharedHandle<Device> {
    SharedHandle::with_parent(
        Device(Some(id)),
        parent,
        DeviceDeleter {
            log: Rc::clone(log),
        },
    )
}

fn buffer(log: &Log, parent: SharedHandle<Device>, id: NonZero<u64>) -> SharedHandle<Buffer> {
    SharedHandle::with_parent(
        Buffer(Some(id)),
        parent,
        BufferDeleter {
            log: Rc::clone(log),
        },
    )
}

#[test]
fn parent_survives_until_child_teardown() {
    let log = new_log();

    let parent = instance(&log, nz!(1));
    let child = device(&log, parent.clone(), nz!(42));

    // The only external parent reference goes away; the child still owns one.
    drop(parent);
    assert!(log.borrow().is_empty());

    // Child teardown runs with the resolved parent value, then the parent's
    // own reference count reaches zero and its deleter follows.
    drop(child);
    assert_eq!(
        *log.borrow(),
        vec![
            Teardown::Device {
                instance: 1,
                device: 42,
            },
            Teardown::Instance(1),
        ]
    );
}

#[test]
fn three_level_chain_cascades_leaf_first() {
    let log = new_log();

    let root = instance(&log, nz!(1));
    let middle = device(&log, root.clone(), nz!(2));
    let leaf = buffer(&log, middle.clone(), nz!(3));

    drop(root);
    drop(middle);
    assert!(log.borrow().is_empty());

    drop(leaf);
    assert_eq!(
        *log.borrow(),
        vec![
            Teardown::Buffer {
                device: 2,
                buffer: 3,
            },
            Teardown::Device {
                instance: 1,
                device: 2,
            },
            Teardown::Instance(1),
        ]
    );
}

#[test]
fn parent_with_remaining_owner_outlives_child() {
    let log = new_log();

    let parent = instance(&log, nz!(1));
    let child = device(&log, parent.clone(), nz!(2));

    drop(child);
    assert_eq!(
        *log.borrow(),
        vec![Teardown::Device {
            instance: 1,
            device: 2,
        }]
    );

    // We still hold the parent; it goes down only now.
    drop(parent);
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(log.borrow().last(), Some(&Teardown::Instance(1)));
}

#[test]
fn parent_handle_extends_the_parent_lifetime() {
    let log = new_log();

    let parent = instance(&log, nz!(1));
    let child = device(&log, parent, nz!(2));

    let resolved_parent = child.parent_handle();
    assert_eq!(resolved_parent.get(), Instance(Some(nz!(1))));

    drop(child);
    assert_eq!(log.borrow().len(), 1);

    // The handle resolved from the child still keeps the parent alive.
    drop(resolved_parent);
    assert_eq!(log.borrow().last(), Some(&Teardown::Instance(1)));
}

#[test]
fn clone_and_take_chains_destroy_exactly_once() {
    let log = new_log();

    let mut original = instance(&log, nz!(1));
    let copy_a = original.clone();
    let mut copy_b = copy_a.clone();

    let moved = original.take();
    let moved_again = copy_b.take();

    drop(original);
    drop(copy_b);
    drop(moved);
    drop(moved_again);
    assert!(log.borrow().is_empty());

    drop(copy_a);
    assert_eq!(*log.borrow(), vec![Teardown::Instance(1)]);
}

#[test]
fn raw_handles_preserves_order() {
    let log = new_log();

    let ids = [nz!(5), nz!(3), nz!(8), nz!(1), nz!(13)];
    let handles: Vec<_> = ids.iter().map(|id| instance(&log, *id)).collect();

    let raw_values = raw_handles(&handles);
    assert_eq!(raw_values.len(), handles.len());

    for (value, id) in raw_values.iter().zip(ids) {
        assert_eq!(*value, Instance(Some(id)));
    }

    // The conversion itself released nothing.
    assert!(log.borrow().is_empty());

    let no_handles: Vec<SharedHandle<Instance>> = Vec::new();
    assert!(raw_handles(&no_handles).is_empty());
}

#[test]
fn put_reuses_a_handle_for_a_new_resource() {
    let log = new_log();

    let parent = instance(&log, nz!(1));
    let mut child = device(&log, parent.clone(), nz!(2));

    // Re-arm the child handle for a fresh resource from a fake factory call.
    let slot = child.put_with_parent(
        parent,
        DeviceDeleter {
            log: Rc::clone(&log),
        },
    );
    assert_eq!(*slot, Device::NULL);
    *slot = Device(Some(nz!(7)));

    // The old resource went down during the put; the parent survived it.
    assert_eq!(
        *log.borrow(),
        vec![Teardown::Device {
            instance: 1,
            device: 2,
        }]
    );

    drop(child);
    assert_eq!(
        log.borrow().last(),
        Some(&Teardown::Instance(1)),
        "parent teardown follows the last child"
    );
}
