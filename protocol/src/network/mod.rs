//! # Network Module
//!
//! Everything between a node and the outside world: the pool of pending
//! transactions headed for its next block, the set of peers it knows, and
//! the transport used to pull their chains.
//!
//! ```text
//! mempool.rs   — Ordered pending transaction pool
//! registry.rs  — Canonical peer host set
//! transport.rs — PeerClient trait, HTTP client, /chain wire type
//! ```
//!
//! HTTP serving happens in the node binary via axum. This crate only
//! defines the client side and the wire types.

pub mod mempool;
pub mod registry;
pub mod transport;

pub use mempool::TransactionPool;
pub use registry::{canonical_host, NodeRegistry, RegistryError};
pub use transport::{ChainResponse, HttpPeerClient, PeerClient, TransportError};
