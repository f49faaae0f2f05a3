//! Filling a handle from a factory-style API with `put()`.
//!
//! Many native APIs create resources through out-parameters: you pass a slot,
//! the API writes the new raw handle into it. `put()` re-arms a `SharedHandle`
//! with a fresh control block and hands back exactly such a slot.

use shared_handle::{Resource, RootControl, SharedHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SurfaceId(u64);

impl Resource for SurfaceId {
    type Control = RootControl<fn(SurfaceId)>;

    const NULL: Self = SurfaceId(0);
}

fn destroy_surface(surface: SurfaceId) {
    println!("destroying surface {}", surface.0);
}

/// Stand-in for a native creation call with an out-parameter.
fn create_surface(out_surface: &mut SurfaceId) {
    *out_surface = SurfaceId(77);
}

fn main() {
    let mut surface = SharedHandle::new(SurfaceId(76), destroy_surface);
    println!("holding surface {}", surface.get().0);

    // Re-arm the handle; the old surface is released first (we are the sole
    // owner), then the factory fills the slot with the replacement.
    create_surface(surface.put(destroy_surface));
    println!("now holding surface {}", surface.get().0);
}
