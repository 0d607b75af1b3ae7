//! Building connections from in-memory collections
//!
//! Implements the pagination algorithm of the Relay Cursor Connections
//! Specification over an ordered collection, or over a slice of one that a
//! backend has already fetched.

use std::future::Future;

use crate::pagination::{
    get_offset_with_default, offset_to_cursor, Connection, ConnectionArguments, Edge, PageInfo,
};

/// Where a slice sits in the full collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArraySliceMetaInfo {
    /// Offset of the first slice element in the full collection.
    pub slice_start: usize,
    /// Length of the full collection.
    pub array_length: usize,
}

/// Build a connection over a complete, ordered collection.
pub fn connection_from_array<T: Clone>(
    data: &[T],
    args: &ConnectionArguments,
) -> crate::Result<Connection<T>> {
    connection_from_array_slice(
        data,
        args,
        ArraySliceMetaInfo {
            slice_start: 0,
            array_length: data.len(),
        },
    )
}

/// Build a connection over `slice`, which holds the elements of a larger
/// collection starting at `meta.slice_start`.
///
/// Only elements present in the slice can appear as edges. Cursors are
/// absolute offsets into the full collection.
pub fn connection_from_array_slice<T: Clone>(
    slice: &[T],
    args: &ConnectionArguments,
    meta: ArraySliceMetaInfo,
) -> crate::Result<Connection<T>> {
    let slice_start = meta.slice_start as i64;
    let slice_end = slice_start + slice.len() as i64;
    let array_length = meta.array_length as i64;

    // Cursors come from clients; anything outside [-1, array_length] selects
    // the same window as the nearest bound.
    let before_offset =
        get_offset_with_default(args.before.as_deref(), array_length).clamp(-1, array_length);
    let after_offset = get_offset_with_default(args.after.as_deref(), -1).clamp(-1, array_length);

    let mut start_offset = (slice_start - 1).max(after_offset) + 1;
    let mut end_offset = slice_end.min(before_offset).min(array_length);

    if let Some(first) = args.first {
        if first < 0 {
            return Err(crate::RelayError::NegativeArgument("first"));
        }
        end_offset = end_offset.min(start_offset + i64::from(first));
    }
    if let Some(last) = args.last {
        if last < 0 {
            return Err(crate::RelayError::NegativeArgument("last"));
        }
        start_offset = start_offset.max(end_offset - i64::from(last));
    }

    // Window bounds relative to the slice.
    let lower = (start_offset - slice_start).max(0);
    let upper = (end_offset - slice_start).min(slice.len() as i64);

    let edges: Vec<Edge<T>> = if lower < upper {
        slice[lower as usize..upper as usize]
            .iter()
            .enumerate()
            .map(|(idx, node)| Edge {
                cursor: offset_to_cursor(start_offset + idx as i64),
                node: node.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let lower_bound = if args.after.is_some() { after_offset + 1 } else { 0 };
    let upper_bound = if args.before.is_some() {
        before_offset
    } else {
        array_length
    };

    let start_cursor = edges.first().map(|e| e.cursor.clone());
    let end_cursor = edges.last().map(|e| e.cursor.clone());

    Ok(Connection {
        edges,
        page_info: PageInfo {
            has_previous_page: args.last.is_some() && start_offset > lower_bound,
            has_next_page: args.first.is_some() && end_offset < upper_bound,
            start_cursor,
            end_cursor,
        },
    })
}

/// Await a collection, then build a connection over it.
///
/// A failed future is propagated unchanged.
pub async fn connection_from_future_array<T, E, F>(
    data: F,
    args: &ConnectionArguments,
) -> Result<Connection<T>, E>
where
    T: Clone,
    E: From<crate::RelayError>,
    F: Future<Output = Result<Vec<T>, E>>,
{
    let data = data.await?;
    Ok(connection_from_array(&data, args)?)
}

/// Await a slice of a larger collection, then build a connection over it.
pub async fn connection_from_future_array_slice<T, E, F>(
    slice: F,
    args: &ConnectionArguments,
    meta: ArraySliceMetaInfo,
) -> Result<Connection<T>, E>
where
    T: Clone,
    E: From<crate::RelayError>,
    F: Future<Output = Result<Vec<T>, E>>,
{
    let slice = slice.await?;
    Ok(connection_from_array_slice(&slice, args, meta)?)
}
