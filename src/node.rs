//! Relay object refetching (`node` / `nodes`)
//!
//! [`NodeDefinitions`] turns a single caller-supplied lookup into the two
//! root resolvers Relay expects: one ID to one object, and a list of IDs to
//! a positionally matching list of objects.

use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;

use crate::request::RequestInfo;

/// Looks up an object by its global ID.
///
/// Implementations usually decode the ID with
/// [`from_global_id`](crate::global_id::from_global_id) and dispatch on the
/// type name. Return `Ok(None)` for unknown or unresolvable IDs; errors are
/// reserved for failures of the data source itself. `info` describes the
/// field being resolved, e.g. which sub-fields the client selected.
#[async_trait]
pub trait NodeFetcher<C>: Send + Sync
where
    C: Send + Sync + ?Sized,
{
    /// The union of all node variants this fetcher can produce.
    type Node: Send;
    type Error: Send;

    async fn fetch(
        &self,
        id: &str,
        ctx: &C,
        info: &RequestInfo,
    ) -> Result<Option<Self::Node>, Self::Error>;
}

/// [`NodeFetcher`] backed by a closure returning a future.
///
/// The future must not borrow the closure arguments; synchronous lookups can
/// compute their result up front and return `async move { Ok(found) }`.
pub struct FnFetcher<F>(F);

/// Wrap a closure as a [`NodeFetcher`].
pub fn fetcher_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher(f)
}

#[async_trait]
impl<C, F, Fut, N, E> NodeFetcher<C> for FnFetcher<F>
where
    C: Send + Sync + ?Sized,
    F: Fn(&str, &C, &RequestInfo) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<N>, E>> + Send,
    N: Send,
    E: Send,
{
    type Node = N;
    type Error = E;

    async fn fetch(&self, id: &str, ctx: &C, info: &RequestInfo) -> Result<Option<N>, E> {
        (self.0)(id, ctx, info).await
    }
}

/// The `node` and `nodes` resolvers for one fetcher
pub struct NodeDefinitions<F> {
    fetcher: Arc<F>,
}

impl<F> NodeDefinitions<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }

    /// Resolve a single ID.
    pub async fn resolve_node<C>(
        &self,
        id: &str,
        ctx: &C,
        info: &RequestInfo,
    ) -> Result<Option<F::Node>, F::Error>
    where
        C: Send + Sync + ?Sized,
        F: NodeFetcher<C>,
    {
        self.fetcher.fetch(id, ctx, info).await
    }

    /// Resolve a list of IDs.
    ///
    /// All lookups are started together and awaited as a group. The result
    /// has one entry per input ID, in input order. If any lookup fails, the
    /// first failure in input order is returned once every lookup has settled.
    pub async fn resolve_nodes<C, S>(
        &self,
        ids: &[S],
        ctx: &C,
        info: &RequestInfo,
    ) -> Result<Vec<Option<F::Node>>, F::Error>
    where
        C: Send + Sync + ?Sized,
        F: NodeFetcher<C>,
        S: AsRef<str>,
    {
        let lookups = ids.iter().map(|id| self.fetcher.fetch(id.as_ref(), ctx, info));
        let settled = join_all(lookups).await;
        let nodes = settled.into_iter().collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            field = info.response_key(),
            requested = ids.len(),
            resolved = nodes.iter().filter(|node| node.is_some()).count(),
            "resolved nodes"
        );
        Ok(nodes)
    }
}

impl<F> Clone for NodeDefinitions<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
        }
    }
}

/// Shorthand for [`NodeDefinitions::new`].
pub fn node_definitions<F>(fetcher: F) -> NodeDefinitions<F> {
    NodeDefinitions::new(fetcher)
}
