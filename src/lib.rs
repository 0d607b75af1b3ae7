//! # pleme-relay-helpers
//!
//! Relay server conventions for Pleme GraphQL services.
//!
//! ## Features
//!
//! - **Global IDs** - opaque, type-tagged object identifiers
//! - **Connections** - cursor pagination over in-memory collections and backend slices
//! - **Client mutation IDs** - mutations echoing the client's correlation token
//! - **Node refetching** - `node` / `nodes` resolvers over a single lookup
//! - **Dynamic schemas** - binding all of the above to `async_graphql::dynamic` fields
//!
//! ## Usage
//!
//! ```rust
//! use pleme_relay_helpers::{
//!     connection_from_array, from_global_id, to_global_id, ConnectionArguments,
//! };
//!
//! let id = to_global_id("Ship", 1);
//! assert_eq!(from_global_id(&id).type_name, "Ship");
//!
//! let ships = vec!["X-Wing", "Y-Wing", "A-Wing"];
//! let args = ConnectionArguments::forward(Some(2), None);
//! let page = connection_from_array(&ships, &args).unwrap();
//! assert_eq!(page.edges.len(), 2);
//! assert!(page.page_info.has_next_page);
//! ```

pub mod connection;
pub mod dynamic;
pub mod global_id;
pub mod mutation;
pub mod node;
pub mod pagination;
pub mod request;

pub use connection::{
    connection_from_array, connection_from_array_slice, connection_from_future_array,
    connection_from_future_array_slice, ArraySliceMetaInfo,
};
pub use global_id::{from_global_id, to_global_id, try_from_global_id, ResolvedGlobalId};
pub use mutation::{
    mutation_fn, mutation_with_client_mutation_id, ClientMutation, MutateAndGetPayload,
    MutationInput, MutationPayload,
};
pub use node::{fetcher_fn, node_definitions, NodeDefinitions, NodeFetcher};
pub use pagination::{
    cursor_for_object_in_connection, cursor_to_offset, get_offset_with_default, offset_to_cursor,
    Connection, ConnectionArguments, CursorCodec, Edge, PageInfo, PaginationConfig,
};
pub use request::RequestInfo;

use thiserror::Error;

/// Relay errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Invalid global id: {0}")]
    InvalidGlobalId(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Argument \"{0}\" must be a non-negative integer")]
    NegativeArgument(&'static str),

    #[error("Argument \"{name}\" cannot exceed {max}")]
    PageSizeExceeded { name: &'static str, max: u32 },
}

/// Result type for Relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
