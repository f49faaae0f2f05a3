/// Teardown capability for a resource type with no parent.
///
/// One deleter instance is stored, by value, inside each control block and is
/// invoked at most once, when the last shared reference to the resource is
/// released. The deleter must not fail; whatever failure mode the underlying
/// teardown routine has is the implementor's responsibility, not this crate's.
///
/// Implemented for any `Fn(T)`, so a plain function pointer works:
///
/// ```rust
/// use shared_handle::Destroy;
///
/// fn close(fd: i32) {
///     // Release the descriptor in the external system.
/// }
///
/// let deleter: fn(i32) = close;
/// deleter.destroy(3);
/// ```
pub trait Destroy<T> {
    /// Destroys the resource identified by `handle`.
    fn destroy(&self, handle: T);
}

/// Teardown capability for a resource type that is destroyed through its parent.
///
/// Like [`Destroy`], but teardown additionally needs the parent's resolved
/// handle value (many external APIs destroy a child object via a call on the
/// parent object). The parent value passed to [`destroy()`][Self::destroy] is
/// read from the still-alive parent handle owned by the control block, so it is
/// guaranteed to identify a live resource at that point.
///
/// Implemented for any `Fn(Parent, T)`.
pub trait DestroyWithParent<Parent, T> {
    /// Destroys the resource identified by `handle`, which belongs to `parent`.
    fn destroy(&self, parent: Parent, handle: T);
}

impl<T, F> Destroy<T> for F
where
    F: Fn(T),
{
    fn destroy(&self, handle: T) {
        self(handle);
    }
}

impl<Parent, T, F> DestroyWithParent<Parent, T> for F
where
    F: Fn(Parent, T),
{
    fn destroy(&self, parent: Parent, handle: T) {
        self(parent, handle);
    }
}

#[cfg(test)]
#[allow(
    clippy::arithmetic_side_effects,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn fn_acts_as_deleter() {
        let calls = Cell::new(0_usize);

        let deleter = |handle: u64| {
            assert_eq!(handle, 42);
            calls.set(calls.get() + 1);
        };

        deleter.destroy(42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fn_acts_as_parented_deleter() {
        let calls = Cell::new(0_usize);

        let deleter = |parent: u64, handle: u64| {
            assert_eq!(parent, 7);
            assert_eq!(handle, 42);
            calls.set(calls.get() + 1);
        };

        deleter.destroy(7, 42);
        assert_eq!(calls.get(), 1);
    }
}
