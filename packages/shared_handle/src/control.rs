use std::fmt;

use crate::{Destroy, DestroyWithParent, Resource, SharedHandle};

/// A reference-counted record that owns everything needed to tear down one
/// resource: its deleter and, for child resource types, an owning handle to
/// the parent resource.
///
/// This trait is sealed; the only implementations are [`RootControl`] and
/// [`ChildControl`], and a resource type picks one of them via
/// [`Resource::Control`]. A control block is immutable once constructed:
/// nothing can swap out the deleter or the parent reference afterwards.
pub trait ControlBlock<T>: Sealed {
    /// Tears down the resource identified by `handle`.
    ///
    /// Called at most once per control block, by the sole remaining owner,
    /// strictly before that owner releases its reference to the block.
    fn destroy(&self, handle: T);
}

/// Control block for resource types with no parent. Owns only the deleter.
pub struct RootControl<D> {
    deleter: D,
}

/// Control block for resource types whose instances must not outlive a parent
/// resource. Owns a shared handle to the parent alongside the deleter.
///
/// The owned parent handle is released only when the control block itself is
/// dropped, which happens after the child's deleter has run. That ordering is
/// what guarantees the parent's own last-reference teardown cannot fire while
/// any child still exists.
pub struct ChildControl<P, D>
where
    P: Resource,
{
    parent: SharedHandle<P>,
    deleter: D,
}

impl<D> RootControl<D> {
    pub(crate) fn new(deleter: D) -> Self {
        Self { deleter }
    }
}

impl<P, D> ChildControl<P, D>
where
    P: Resource,
{
    pub(crate) fn new(parent: SharedHandle<P>, deleter: D) -> Self {
        Self { parent, deleter }
    }

    pub(crate) fn parent(&self) -> &SharedHandle<P> {
        &self.parent
    }
}

impl<T, D> ControlBlock<T> for RootControl<D>
where
    T: Resource,
    D: Destroy<T>,
{
    fn destroy(&self, handle: T) {
        self.deleter.destroy(handle);
    }
}

impl<T, P, D> ControlBlock<T> for ChildControl<P, D>
where
    T: Resource,
    P: Resource,
    D: DestroyWithParent<P, T>,
{
    fn destroy(&self, handle: T) {
        // The parent handle we own is still alive here, so its resolved value
        // is valid for the duration of the deleter call.
        self.deleter.destroy(self.parent.get(), handle);
    }
}

impl<D> fmt::Debug for RootControl<D> {
    #[cfg_attr(test, mutants::skip)] // Diagnostic output only, mutation is meaningless.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootControl").finish_non_exhaustive()
    }
}

impl<P, D> fmt::Debug for ChildControl<P, D>
where
    P: Resource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildControl")
            .field("parent_valid", &self.parent.is_valid())
            .finish_non_exhaustive()
    }
}

#[doc(hidden)]
pub trait Sealed {}

impl<D> Sealed for RootControl<D> {}
impl<P: Resource, D> Sealed for ChildControl<P, D> {}
