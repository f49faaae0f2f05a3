use std::fmt;
use std::mem;
use std::ops::Deref;
use std::sync::Arc;

use crate::{ChildControl, ControlBlock, Destroy, DestroyWithParent, Resource, RootControl};

/// Shared ownership of one externally managed resource.
///
/// A `SharedHandle<T>` pairs a raw handle value of type `T` with a reference
/// to a control block that owns the resource's deleter and, for child resource
/// types, an owning handle to the parent resource. Cloning a handle shares the
/// control block; the deleter runs exactly once, when the last handle
/// referencing the control block releases it.
///
/// # Parent and child resources
///
/// Whether a resource type has a parent is declared at compile time through
/// [`Resource::Control`]. Handles for parentless types are built with
/// [`new()`](Self::new); handles for child types are built with
/// [`with_parent()`](Self::with_parent) and keep the parent alive for as long
/// as any handle to the child exists. When the last handle to a child is
/// released, the child's deleter runs strictly before the owned parent
/// reference is released, so a parent can never be torn down while one of its
/// children is still alive.
///
/// # Thread safety
///
/// The reference count is atomic ([`Arc`]), so distinct `SharedHandle`
/// instances sharing one control block may live on different threads and be
/// read, cloned, and dropped concurrently. What is *not* supported is mutating
/// the same instance from multiple threads at once: `reset`, `put*`,
/// assignment, and [`take()`](Self::take) assume a single writer per instance.
/// The sole-owner check inside [`reset()`](Self::reset) is a check-then-act
/// sequence and relies on that discipline.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use shared_handle::{Resource, RootControl, SharedHandle};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// struct TextureId(u64);
///
/// impl Resource for TextureId {
///     type Control = RootControl<fn(TextureId)>;
///
///     const NULL: Self = TextureId(0);
/// }
///
/// static RELEASED: AtomicUsize = AtomicUsize::new(0);
///
/// fn release_texture(_texture: TextureId) {
///     RELEASED.fetch_add(1, Ordering::Relaxed);
/// }
///
/// let texture = SharedHandle::new(TextureId(9), release_texture);
/// let also_texture = texture.clone();
///
/// drop(texture);
/// assert_eq!(RELEASED.load(Ordering::Relaxed), 0); // One owner remains.
///
/// drop(also_texture);
/// assert_eq!(RELEASED.load(Ordering::Relaxed), 1); // Last owner released.
/// ```
pub struct SharedHandle<T>
where
    T: Resource,
{
    handle: T,
    control: Option<Arc<T::Control>>,
}

impl<T> SharedHandle<T>
where
    T: Resource,
{
    /// Creates a handle that references no resource.
    ///
    /// Equivalent to [`Default::default()`]. Holds neither a handle value nor
    /// a control block; dropping it has no effect.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handle: T::NULL,
            control: None,
        }
    }

    /// Returns the current raw handle value.
    ///
    /// Never fails and does not affect the reference count. Returns
    /// [`Resource::NULL`] for an empty handle.
    #[must_use]
    #[inline]
    pub fn get(&self) -> T {
        self.handle
    }

    /// Whether this handle currently references a resource.
    ///
    /// True iff the raw handle value is non-null.
    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }

    /// Releases this handle's claim on the resource.
    ///
    /// No-op if the handle value is already null. Otherwise, if this instance
    /// is the sole remaining owner of the control block, the deleter is
    /// invoked first (for child resource types, with the parent's resolved
    /// handle value read from the still-alive owned parent handle); only then
    /// is the control-block reference released and the handle value cleared.
    /// That ordering is what sequences child teardown strictly before the
    /// parent reference can be released.
    ///
    /// If other owners remain, no teardown happens; the handle merely becomes
    /// empty and the remaining owners stay responsible for the resource.
    pub fn reset(&mut self) {
        if self.handle.is_null() {
            return;
        }

        let handle = mem::replace(&mut self.handle, T::NULL);

        if let Some(control) = self.control.take() {
            if Arc::strong_count(&control) == 1 {
                control.destroy(handle);
            }

            // The control block reference is released here, after teardown.
            // For child resource types this is the moment the owned parent
            // handle may itself reach zero references and cascade.
        }
    }

    /// Moves the current state out of this handle, leaving it empty.
    ///
    /// The returned handle owns whatever this instance owned; this instance
    /// reports a null handle value afterwards and its subsequent reset or drop
    /// performs no deleter call.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shared_handle::{Resource, RootControl, SharedHandle};
    ///
    /// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// struct TextureId(u64);
    ///
    /// impl Resource for TextureId {
    ///     type Control = RootControl<fn(TextureId)>;
    ///
    ///     const NULL: Self = TextureId(0);
    /// }
    ///
    /// fn release_texture(_texture: TextureId) {}
    ///
    /// let mut first = SharedHandle::new(TextureId(9), release_texture);
    /// let second = first.take();
    ///
    /// assert!(!first.is_valid());
    /// assert_eq!(second.get(), TextureId(9));
    /// ```
    #[must_use]
    pub fn take(&mut self) -> Self {
        Self {
            handle: mem::replace(&mut self.handle, T::NULL),
            control: self.control.take(),
        }
    }

    /// Number of handles currently sharing the control block, if any.
    ///
    /// Snapshot only; other threads may change it immediately. Exposed mainly
    /// for diagnostics and tests.
    #[must_use]
    pub fn owners(&self) -> Option<usize> {
        self.control.as_ref().map(Arc::strong_count)
    }

    fn with_control(handle: T, control: T::Control) -> Self {
        Self {
            handle,
            control: Some(Arc::new(control)),
        }
    }

    fn put_control(&mut self, control: T::Control) -> &mut T {
        self.reset();
        self.control = Some(Arc::new(control));
        &mut self.handle
    }
}

impl<T, D> SharedHandle<T>
where
    T: Resource<Control = RootControl<D>>,
    D: Destroy<T>,
{
    /// Creates a handle owning `handle`, with `deleter` as its teardown
    /// capability.
    ///
    /// The handle value is not validated; pairing a null value with a live
    /// control block is legal and simply means "no resource yet".
    #[must_use]
    pub fn new(handle: T, deleter: D) -> Self {
        Self::with_control(handle, RootControl::new(deleter))
    }

    /// Creates a handle owning `handle`, with a default-constructed deleter.
    #[must_use]
    pub fn new_default(handle: T) -> Self
    where
        D: Default,
    {
        Self::new(handle, D::default())
    }

    /// Releases the currently held resource, installs a fresh control block
    /// around `deleter`, and returns the slot for the new handle value.
    ///
    /// The slot starts out null; it is meant to be filled by an external
    /// factory call that produces the new resource. Any previously held
    /// resource is released first, with the usual sole-owner teardown rule:
    /// if other owners remain they keep the old resource alive, untouched.
    pub fn put(&mut self, deleter: D) -> &mut T {
        self.put_control(RootControl::new(deleter))
    }
}

impl<T, P, D> SharedHandle<T>
where
    T: Resource<Control = ChildControl<P, D>>,
    P: Resource,
    D: DestroyWithParent<P, T>,
{
    /// Creates a handle owning `handle`, whose resource belongs to `parent`.
    ///
    /// The control block takes ownership of `parent`, keeping the parent
    /// resource alive at least until this child has been torn down.
    #[must_use]
    pub fn with_parent(handle: T, parent: SharedHandle<P>, deleter: D) -> Self {
        Self::with_control(handle, ChildControl::new(parent, deleter))
    }

    /// Creates a handle owning `handle` under `parent`, with a
    /// default-constructed deleter.
    #[must_use]
    pub fn with_parent_default(handle: T, parent: SharedHandle<P>) -> Self
    where
        D: Default,
    {
        Self::with_parent(handle, parent, D::default())
    }

    /// Releases the currently held resource, installs a fresh control block
    /// owning `parent` and `deleter`, and returns the slot for the new handle
    /// value. See [`put()`][SharedHandle::put] for the slot contract.
    pub fn put_with_parent(&mut self, parent: SharedHandle<P>, deleter: D) -> &mut T {
        self.put_control(ChildControl::new(parent, deleter))
    }

    /// The parent's resolved raw handle value.
    ///
    /// Only exists for resource types that declare a parent; for parentless
    /// types this method does not compile.
    ///
    /// # Panics
    ///
    /// Panics if this handle has no control block (it was default-constructed,
    /// reset, or taken from).
    #[must_use]
    pub fn parent(&self) -> P {
        self.child_control().parent().get()
    }

    /// A new handle sharing ownership of the parent resource.
    ///
    /// Increments the parent's reference count; the returned handle is
    /// independent of this child and may outlive it.
    ///
    /// # Panics
    ///
    /// Panics if this handle has no control block (it was default-constructed,
    /// reset, or taken from).
    #[must_use]
    pub fn parent_handle(&self) -> SharedHandle<P> {
        self.child_control().parent().clone()
    }

    fn child_control(&self) -> &ChildControl<P, D> {
        self.control
            .as_deref()
            .expect("handle has no control block, so there is no parent to resolve")
    }
}

impl<T> Default for SharedHandle<T>
where
    T: Resource,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Clone for SharedHandle<T>
where
    T: Resource,
{
    /// Creates another handle sharing ownership of the same resource.
    ///
    /// Increments the control block's reference count; the resource is torn
    /// down only when the last of the sharing handles is released.
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            control: self.control.clone(),
        }
    }
}

impl<T> Drop for SharedHandle<T>
where
    T: Resource,
{
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Deref for SharedHandle<T>
where
    T: Resource,
{
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T> PartialEq for SharedHandle<T>
where
    T: Resource,
{
    /// Two handles are equal when they hold the same raw handle value and
    /// share the same control block (or are both empty).
    fn eq(&self, other: &Self) -> bool {
        if self.handle != other.handle {
            return false;
        }

        match (&self.control, &other.control) {
            (None, None) => true,
            (Some(ours), Some(theirs)) => Arc::ptr_eq(ours, theirs),
            _ => false,
        }
    }
}

impl<T> Eq for SharedHandle<T> where T: Resource {}

impl<T> fmt::Debug for SharedHandle<T>
where
    T: Resource + fmt::Debug,
{
    #[cfg_attr(test, mutants::skip)] // Diagnostic output only, mutation is meaningless.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandle")
            .field("handle", &self.handle)
            .field("owners", &self.owners())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Buffer(u64);

    impl Resource for Buffer {
        type Control = RootControl<BufferRecorder>;

        const NULL: Self = Buffer(0);
    }

    /// Deleter that records every buffer it destroys.
    struct BufferRecorder {
        destroyed: Rc<RefCell<Vec<u64>>>,
    }

    impl BufferRecorder {
        fn new() -> (Self, Rc<RefCell<Vec<u64>>>) {
            let destroyed = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    destroyed: Rc::clone(&destroyed),
                },
                destroyed,
            )
        }
    }

    impl Destroy<Buffer> for BufferRecorder {
        fn destroy(&self, handle: Buffer) {
            self.destroyed.borrow_mut().push(handle.0);
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Device(u64);

    impl Resource for Device {
        type Control = RootControl<fn(Device)>;

        const NULL: Self = Device(0);
    }

    fn ignore_device(_: Device) {}

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Image(u64);

    impl Resource for Image {
        type Control = ChildControl<Device, ImageRecorder>;

        const NULL: Self = Image(0);
    }

    /// Deleter that records (parent, child) pairs it destroys.
    struct ImageRecorder {
        destroyed: Rc<RefCell<Vec<(u64, u64)>>>,
    }

    impl ImageRecorder {
        fn new() -> (Self, Rc<RefCell<Vec<(u64, u64)>>>) {
            let destroyed = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    destroyed: Rc::clone(&destroyed),
                },
                destroyed,
            )
        }
    }

    impl DestroyWithParent<Device, Image> for ImageRecorder {
        fn destroy(&self, parent: Device, handle: Image) {
            self.destroyed.borrow_mut().push((parent.0, handle.0));
        }
    }

    #[test]
    fn empty_handle_references_nothing() {
        let handle = SharedHandle::<Buffer>::empty();

        assert!(!handle.is_valid());
        assert_eq!(handle.get(), Buffer::NULL);
        assert_eq!(handle.owners(), None);

        assert_eq!(handle, SharedHandle::default());
    }

    #[test]
    fn sole_owner_drop_destroys_once() {
        let (recorder, destroyed) = BufferRecorder::new();

        let handle = SharedHandle::new(Buffer(11), recorder);
        assert!(handle.is_valid());
        assert_eq!(handle.get(), Buffer(11));
        assert!(destroyed.borrow().is_empty());

        drop(handle);
        assert_eq!(*destroyed.borrow(), vec![11]);
    }

    #[test]
    fn clones_share_a_single_destruction() {
        let (recorder, destroyed) = BufferRecorder::new();

        let first = SharedHandle::new(Buffer(11), recorder);
        let second = first.clone();
        let third = second.clone();

        assert_eq!(first.owners(), Some(3));

        drop(first);
        drop(third);
        assert!(destroyed.borrow().is_empty());
        assert_eq!(second.get(), Buffer(11));

        drop(second);
        assert_eq!(*destroyed.borrow(), vec![11]);
    }

    #[test]
    fn reset_of_sole_owner_destroys_and_empties() {
        let (recorder, destroyed) = BufferRecorder::new();

        let mut handle = SharedHandle::new(Buffer(11), recorder);
        handle.reset();

        assert!(!handle.is_valid());
        assert_eq!(handle.owners(), None);
        assert_eq!(*destroyed.borrow(), vec![11]);

        // A second reset is a no-op.
        handle.reset();
        assert_eq!(*destroyed.borrow(), vec![11]);
    }

    #[test]
    fn reset_with_other_owners_does_not_destroy() {
        let (recorder, destroyed) = BufferRecorder::new();

        let mut first = SharedHandle::new(Buffer(11), recorder);
        let second = first.clone();

        first.reset();
        assert!(!first.is_valid());
        assert!(destroyed.borrow().is_empty());
        assert_eq!(second.owners(), Some(1));

        drop(second);
        assert_eq!(*destroyed.borrow(), vec![11]);
    }

    #[test]
    fn reset_of_empty_handle_is_noop() {
        let mut handle = SharedHandle::<Buffer>::empty();
        handle.reset();
        assert!(!handle.is_valid());
    }

    #[test]
    fn take_empties_the_source() {
        let (recorder, destroyed) = BufferRecorder::new();

        let mut first = SharedHandle::new(Buffer(11), recorder);
        let second = first.take();

        assert!(!first.is_valid());
        assert_eq!(second.get(), Buffer(11));
        assert_eq!(second.owners(), Some(1));

        // The emptied source performs no deleter call on release.
        drop(first);
        assert!(destroyed.borrow().is_empty());

        drop(second);
        assert_eq!(*destroyed.borrow(), vec![11]);
    }

    #[test]
    fn self_assignment_is_safe() {
        let (recorder, destroyed) = BufferRecorder::new();

        let mut handle = SharedHandle::new(Buffer(11), recorder);

        // Self-assignment: the clone raises the count to two before the old
        // value is released, so the release must not tear anything down.
        handle = handle.clone();

        assert!(handle.is_valid());
        assert_eq!(handle.owners(), Some(1));
        assert!(destroyed.borrow().is_empty());

        drop(handle);
        assert_eq!(*destroyed.borrow(), vec![11]);
    }

    #[test]
    fn put_releases_old_and_installs_fresh_control() {
        let (first_recorder, first_destroyed) = BufferRecorder::new();
        let (second_recorder, second_destroyed) = BufferRecorder::new();

        let mut handle = SharedHandle::new(Buffer(11), first_recorder);

        let slot = handle.put(second_recorder);
        assert_eq!(*slot, Buffer::NULL);
        *slot = Buffer(22);

        // Sole owner, so the old resource went down during the put.
        assert_eq!(*first_destroyed.borrow(), vec![11]);

        assert_eq!(handle.get(), Buffer(22));
        drop(handle);
        assert_eq!(*second_destroyed.borrow(), vec![22]);
    }

    #[test]
    fn put_with_live_second_owner_leaves_old_resource_alone() {
        let (first_recorder, first_destroyed) = BufferRecorder::new();
        let (second_recorder, second_destroyed) = BufferRecorder::new();

        let mut first = SharedHandle::new(Buffer(11), first_recorder);
        let second = first.clone();

        *first.put(second_recorder) = Buffer(22);

        // The second owner still observes the old resource and now solely
        // owns its teardown; the put-ing instance owns a fresh control block.
        assert!(first_destroyed.borrow().is_empty());
        assert_eq!(second.get(), Buffer(11));
        assert_eq!(second.owners(), Some(1));
        assert_eq!(first.owners(), Some(1));

        drop(second);
        assert_eq!(*first_destroyed.borrow(), vec![11]);

        drop(first);
        assert_eq!(*second_destroyed.borrow(), vec![22]);
    }

    #[test]
    fn child_resolves_parent_value_and_handle() {
        let (recorder, _destroyed) = ImageRecorder::new();

        let device = SharedHandle::new(Device(7), ignore_device as fn(Device));
        let image = SharedHandle::with_parent(Image(42), device.clone(), recorder);

        assert_eq!(image.parent(), Device(7));

        let parent = image.parent_handle();
        assert_eq!(parent.get(), Device(7));
        // Original + child's control block + the handle we just resolved.
        assert_eq!(parent.owners(), Some(3));
        assert_eq!(parent, device);
    }

    #[test]
    fn child_deleter_receives_resolved_parent_value() {
        let (recorder, destroyed) = ImageRecorder::new();

        let device = SharedHandle::new(Device(7), ignore_device as fn(Device));
        let image = SharedHandle::with_parent(Image(42), device, recorder);

        drop(image);
        assert_eq!(*destroyed.borrow(), vec![(7, 42)]);
    }

    #[test]
    fn put_with_parent_installs_fresh_control() {
        let (first_recorder, first_destroyed) = ImageRecorder::new();
        let (second_recorder, second_destroyed) = ImageRecorder::new();

        let device = SharedHandle::new(Device(7), ignore_device as fn(Device));
        let mut image = SharedHandle::with_parent(Image(42), device.clone(), first_recorder);

        *image.put_with_parent(device, second_recorder) = Image(43);

        assert_eq!(*first_destroyed.borrow(), vec![(7, 42)]);
        assert_eq!(image.get(), Image(43));

        drop(image);
        assert_eq!(*second_destroyed.borrow(), vec![(7, 43)]);
    }

    #[test]
    #[should_panic]
    fn parent_of_empty_handle_panics() {
        let image = SharedHandle::<Image>::empty();
        _ = image.parent();
    }

    #[test]
    fn default_constructible_deleter_conveniences() {
        #[derive(Debug, Default)]
        struct Silent;

        impl Destroy<Widget> for Silent {
            fn destroy(&self, _handle: Widget) {}
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        struct Widget(u64);

        impl Resource for Widget {
            type Control = RootControl<Silent>;

            const NULL: Self = Widget(0);
        }

        let widget = SharedHandle::new_default(Widget(5));
        assert_eq!(widget.get(), Widget(5));
    }

    #[test]
    fn deref_exposes_the_handle_value() {
        let device = SharedHandle::new(Device(7), ignore_device as fn(Device));
        assert_eq!(*device, Device(7));
    }

    #[test]
    fn equality_requires_shared_control_block() {
        let first = SharedHandle::new(Device(7), ignore_device as fn(Device));
        let same = first.clone();
        let lookalike = SharedHandle::new(Device(7), ignore_device as fn(Device));

        assert_eq!(first, same);
        assert_ne!(first, lookalike);
        assert_ne!(first, SharedHandle::empty());
        assert_eq!(SharedHandle::<Device>::empty(), SharedHandle::empty());
    }

    #[test]
    fn debug_output_shows_owner_count() {
        let device = SharedHandle::new(Device(7), ignore_device as fn(Device));
        let rendered = format!("{device:?}");

        assert!(rendered.contains("SharedHandle"));
        assert!(rendered.contains("owners"));
    }

    // Handles whose entire control chain is thread-safe travel across threads;
    // an Rc-carrying deleter pins the handle to one thread.
    assert_impl_all!(SharedHandle<Device>: Send, Sync);
    assert_not_impl_any!(SharedHandle<Buffer>: Send, Sync);
}
