//! Echo walkthrough.
//!
//! Builds a dispatcher over `demos/handlers`, prints any handler warnings,
//! then drives an in-memory session through handshake and transfer.
//!
//! Run with `cargo run --example echo` from the crate root.

use wsdispatch::{Dispatcher, MemorySession};

fn main() -> wsdispatch::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let dispatcher = Dispatcher::new("demos/handlers")?;
    for warning in dispatcher.source_warnings() {
        eprintln!("handler warning: {warning}");
    }

    let mut session = MemorySession::new("/echo")
        .with_origin("http://example.com")
        .with_protocol("chat");
    session.push_incoming("hello");
    session.push_incoming("world");

    dispatcher.shake_hands(&mut session)?;
    dispatcher.transfer_data(&mut session)?;

    for message in session.sent() {
        println!("< {message}");
    }
    Ok(())
}
