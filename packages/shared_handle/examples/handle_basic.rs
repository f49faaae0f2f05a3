//! Basic usage of `SharedHandle` with a parentless resource type.

use shared_handle::{Resource, RootControl, SharedHandle};

/// Identifier of a connection in some external native library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ConnectionId(u64);

impl Resource for ConnectionId {
    type Control = RootControl<fn(ConnectionId)>;

    const NULL: Self = ConnectionId(0);
}

fn close_connection(connection: ConnectionId) {
    println!("closing connection {}", connection.0);
}

fn main() {
    let connection = SharedHandle::new(ConnectionId(10), close_connection);
    println!("opened connection {}", connection.get().0);

    // Hand a co-owning handle to another component.
    let also_connection = connection.clone();

    // Our reference goes away; the connection stays open for the co-owner.
    drop(connection);
    println!("one owner remains: {}", also_connection.is_valid());

    // The last owner releasing the handle triggers the actual close.
    drop(also_connection);
    println!("all owners released");
}
