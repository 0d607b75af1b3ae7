//! Relay-style cursor pagination types
//!
//! Follows the Relay Cursor Connections Specification:
//! https://relay.dev/graphql/connections.htm

use async_graphql::{InputObject, Object, SimpleObject};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

const CURSOR_PREFIX: &str = "arrayconnection:";

/// Page information
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// When paginating forwards, are there more items?
    pub has_next_page: bool,
    /// When paginating backwards, are there more items?
    pub has_previous_page: bool,
    /// When paginating backwards, the cursor to continue.
    pub start_cursor: Option<String>,
    /// When paginating forwards, the cursor to continue.
    pub end_cursor: Option<String>,
}

/// Edge in a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[Object]
impl<T: async_graphql::OutputType> Edge<T> {
    /// A cursor for use in pagination.
    async fn cursor(&self) -> &str {
        &self.cursor
    }

    /// The item at the end of the edge
    async fn node(&self) -> &T {
        &self.node
    }
}

/// Connection (paginated result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

#[Object]
impl<T: async_graphql::OutputType> Connection<T> {
    /// A list of edges.
    async fn edges(&self) -> &[Edge<T>] {
        &self.edges
    }

    /// Information to aid in pagination.
    async fn page_info(&self) -> &PageInfo {
        &self.page_info
    }
}

impl<T> Connection<T> {
    /// Create empty connection
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo::default(),
        }
    }

    /// The nodes of this page, in edge order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

/// Offset cursor encoding/decoding
pub struct CursorCodec;

impl CursorCodec {
    /// Encode an offset into an opaque cursor
    pub fn encode(offset: i64) -> String {
        BASE64.encode(format!("{CURSOR_PREFIX}{offset}"))
    }

    /// Decode an opaque cursor back into its offset
    pub fn decode(cursor: &str) -> crate::Result<i64> {
        let bytes = BASE64
            .decode(cursor.as_bytes())
            .map_err(|e| crate::RelayError::InvalidCursor(e.to_string()))?;
        let raw = String::from_utf8(bytes)
            .map_err(|e| crate::RelayError::InvalidCursor(e.to_string()))?;
        raw.strip_prefix(CURSOR_PREFIX)
            .ok_or_else(|| {
                crate::RelayError::InvalidCursor(format!("missing '{CURSOR_PREFIX}' prefix"))
            })?
            .parse::<i64>()
            .map_err(|e| crate::RelayError::InvalidCursor(e.to_string()))
    }
}

/// Creates the cursor string from an offset.
pub fn offset_to_cursor(offset: i64) -> String {
    CursorCodec::encode(offset)
}

/// Extracts the offset from the cursor string, `None` if it is not an offset cursor.
pub fn cursor_to_offset(cursor: &str) -> Option<i64> {
    CursorCodec::decode(cursor).ok()
}

/// Offset of an optional cursor, falling back to `default_offset` when the
/// cursor is absent or cannot be decoded.
pub fn get_offset_with_default(cursor: Option<&str>, default_offset: i64) -> i64 {
    match cursor {
        Some(cursor) => cursor_to_offset(cursor).unwrap_or_else(|| {
            tracing::debug!(cursor, "ignoring undecodable cursor");
            default_offset
        }),
        None => default_offset,
    }
}

/// Cursor of the first element of `data` equal to `object`.
pub fn cursor_for_object_in_connection<T: PartialEq>(data: &[T], object: &T) -> Option<String> {
    data.iter()
        .position(|item| item == object)
        .map(|offset| offset_to_cursor(offset as i64))
}

/// Pagination limits applied by [`ConnectionArguments::validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Upper bound for `first` and `last`. `None` leaves page sizes unbounded.
    pub max_page_size: Option<u32>,
}

/// Arguments of a connection field
#[derive(InputObject, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionArguments {
    /// Returns the elements in the list that come before the specified cursor.
    pub before: Option<String>,

    /// Returns the elements in the list that come after the specified cursor.
    pub after: Option<String>,

    /// Returns the first n elements from the list.
    pub first: Option<i32>,

    /// Returns the last n elements from the list.
    pub last: Option<i32>,
}

impl ConnectionArguments {
    /// Forward pagination arguments (`first` / `after`)
    pub fn forward(first: Option<i32>, after: Option<String>) -> Self {
        Self {
            first,
            after,
            ..Self::default()
        }
    }

    /// Backward pagination arguments (`last` / `before`)
    pub fn backward(last: Option<i32>, before: Option<String>) -> Self {
        Self {
            last,
            before,
            ..Self::default()
        }
    }

    /// Validate `first` and `last` against the non-negativity rule and the configured page size
    pub fn validate(&self, config: &PaginationConfig) -> crate::Result<()> {
        for (name, value) in [("first", self.first), ("last", self.last)] {
            let Some(value) = value else { continue };
            if value < 0 {
                return Err(crate::RelayError::NegativeArgument(name));
            }
            if let Some(max) = config.max_page_size {
                if value as u32 > max {
                    return Err(crate::RelayError::PageSizeExceeded { name, max });
                }
            }
        }

        Ok(())
    }
}
