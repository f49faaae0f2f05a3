use crate::ControlBlock;

/// An opaque, copyable identifier for an externally managed resource.
///
/// Implement this trait on the raw handle value type of each resource kind you
/// want to manage through [`SharedHandle`][crate::SharedHandle]. The value is
/// just an identifier (an integer id, a native pointer, an index); the resource
/// it names lives outside this crate and is torn down by a caller-supplied
/// deleter, never by the handle value itself.
///
/// The [`Control`][Self::Control] associated type declares, per resource type
/// and at compile time, whether the resource depends on a parent resource:
///
/// - [`RootControl<D>`][crate::RootControl] for resource types with no parent.
/// - [`ChildControl<P, D>`][crate::ChildControl] for resource types whose
///   instances must not outlive an instance of parent resource type `P`.
///
/// Because the shape is part of the type, parent-related operations such as
/// [`SharedHandle::parent()`][crate::SharedHandle::parent] simply do not exist
/// on handles for parentless resource types.
///
/// # Example
///
/// ```rust
/// use shared_handle::{Resource, RootControl};
///
/// /// Identifier of a loaded plugin in some external runtime.
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// struct PluginId(u64);
///
/// impl Resource for PluginId {
///     type Control = RootControl<fn(PluginId)>;
///
///     const NULL: Self = PluginId(0);
/// }
///
/// assert!(PluginId::NULL.is_null());
/// assert!(!PluginId(7).is_null());
/// ```
pub trait Resource: Copy + Eq {
    /// The control block shape for this resource type, which determines both
    /// the deleter type and whether a parent handle is owned alongside it.
    type Control: ControlBlock<Self>;

    /// The designated "no resource" value.
    const NULL: Self;

    /// Whether this value is the designated "no resource" value.
    #[must_use]
    fn is_null(self) -> bool {
        self == Self::NULL
    }
}
