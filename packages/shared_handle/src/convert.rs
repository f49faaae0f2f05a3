use crate::{Resource, SharedHandle};

/// Collects the raw handle values out of a sequence of shared handles.
///
/// The output has the same length and order as the input: element `i` is the
/// current handle value of the `i`-th input. Ownership is untouched; no
/// reference count changes and no teardown happens. Useful for external API
/// calls that take a contiguous array of raw handle values.
///
/// # Example
///
/// ```rust
/// use shared_handle::{Resource, RootControl, SharedHandle, raw_handles};
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
/// let textures = vec![
///     SharedHandle::new(TextureId(1), release_texture),
///     SharedHandle::new(TextureId(2), release_texture),
/// ];
///
/// assert_eq!(raw_handles(&textures), vec![TextureId(1), TextureId(2)]);
/// ```
#[must_use]
pub fn raw_handles<T>(handles: &[SharedHandle<T>]) -> Vec<T>
where
    T: Resource,
{
    handles.iter().map(SharedHandle::get).collect()
}
