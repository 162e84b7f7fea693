//! # World Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a chainrpc service for integration
//! testing `chainrpc-core` and for the `chainrpc` console. It is not intended for production use.
//!
//! Its types are written the way generated code writes them: plain structs and enums with
//! descriptors in `static` items, interface traits, and client adapters over an
//! [`InvocationProxy`](chainrpc_core::InvocationProxy).
//!
//! ```rust,ignore
//! let world = world_service::client(session)?;
//! let human = world.humans()?.create(Some(Human::named("John")))?;
//! ```
pub mod client;
pub mod interfaces;
pub mod memory;
pub mod messages;

pub use client::{ContinentsClient, HumansClient, WorldClient};
pub use interfaces::{Continents, Humans, World, WorldReceiver};
pub use memory::InMemoryWorld;
pub use messages::{
    BirthEvent, Continent, ContinentName, DeathEvent, Event, EventType, Human, Location, Sex,
    WorldException,
};

use chainrpc_core::{DescriptorError, RpcClient, RpcHandler, RpcSession};

/// A client of the World service over `session`.
pub fn client(session: impl RpcSession + 'static) -> Result<WorldClient, DescriptorError> {
    let client = RpcClient::new(&interfaces::WORLD, session)?;
    Ok(WorldClient(client.proxy()))
}

/// A handler serving `world`.
pub fn handler(world: WorldReceiver) -> Result<RpcHandler<WorldReceiver>, DescriptorError> {
    RpcHandler::new(&interfaces::WORLD, world)
}
