//! `async_graphql::dynamic` bindings for the Relay helpers.
//!
//! Registers the shared Relay types on a [`SchemaBuilder`] and builds the
//! fields whose resolvers call into [`crate::node`], [`crate::connection`]
//! and [`crate::mutation`].
//!
//! Resolvers read their context from `ctx.data::<D>()`: a fetcher or mutation
//! implemented for `D` receives the request's `D` when one was attached to the
//! request, and the schema's otherwise. The field being resolved is described
//! by a [`RequestInfo`] built with [`request_info`].
//!
//! See: https://relay.dev/docs/guides/graphql-server-specification/

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Interface, InterfaceField, Object,
    ObjectAccessor, ResolverContext, SchemaBuilder, TypeRef,
};
use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextResolve, ResolveInfo,
};
use async_graphql::{Error, ServerResult, Value};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt::Display;
use std::sync::Arc;

use crate::global_id::to_global_id;
use crate::mutation::{ClientMutation, MutateAndGetPayload, MutationInput, MutationPayload};
use crate::node::{NodeDefinitions, NodeFetcher};
use crate::pagination::{Connection, ConnectionArguments, Edge, PageInfo, PaginationConfig};
use crate::request::RequestInfo;

pub const NODE: &str = "Node";
pub const PAGE_INFO: &str = "PageInfo";

const CLIENT_MUTATION_ID: &str = "clientMutationId";

// Type tag of `nodes` entries that did not resolve. Implements nothing.
const UNRESOLVED_NODE: &str = "__UnresolvedNode";

/// A connection type pair (`{name}Connection` / `{name}Edge`)
pub struct ConnectionConfig {
    name: String,
    node_type: Option<String>,
    edge_fields: Vec<Field>,
    connection_fields: Vec<Field>,
}

impl ConnectionConfig {
    /// Nodes default to the type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: None,
            edge_fields: Vec::new(),
            connection_fields: Vec::new(),
        }
    }

    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Extra edge field. Its parent value is the [`Edge`].
    pub fn edge_field(mut self, field: Field) -> Self {
        self.edge_fields.push(field);
        self
    }

    /// Extra connection field, e.g. `totalCount`. Its parent value is the [`Connection`].
    pub fn connection_field(mut self, field: Field) -> Self {
        self.connection_fields.push(field);
        self
    }

    pub fn edge_type_name(&self) -> String {
        format!("{}Edge", self.name)
    }

    pub fn connection_type_name(&self) -> String {
        format!("{}Connection", self.name)
    }
}

/// Caller-defined fields of a mutation's input and payload types
#[derive(Default)]
pub struct MutationConfig {
    input_fields: Vec<InputValue>,
    output_fields: Vec<Field>,
}

impl MutationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_field(mut self, field: InputValue) -> Self {
        self.input_fields.push(field);
        self
    }

    /// Payload field. Read the operation's output with [`payload_ref`].
    pub fn output_field(mut self, field: Field) -> Self {
        self.output_fields.push(field);
        self
    }
}

/// Everything a mutation adds to a schema
pub struct MutationDefinition {
    /// `{Name}Input`
    pub input_type: InputObject,
    /// `{Name}Payload`
    pub payload_type: Object,
    /// The field to add to the `Mutation` root object
    pub field: Field,
}

pub trait SchemaBuilderRelayExt {
    /// Register the `Node` interface, and [`UnresolvedNodes`] so that `nodes`
    /// can answer `null` for IDs that do not resolve.
    fn register_node_interface(self) -> Self;

    /// Register the `PageInfo` object shared by all connections.
    fn register_page_info(self) -> Self;

    /// Register a `{name}Connection` / `{name}Edge` pair resolving over [`Connection<N>`].
    fn register_connection<N>(self, config: ConnectionConfig) -> Self
    where
        N: Any + Send + Sync;
}

impl SchemaBuilderRelayExt for SchemaBuilder {
    fn register_node_interface(self) -> Self {
        let node = Interface::new(NODE).description("An object with an ID").field(
            InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID))
                .description("The id of the object."),
        );
        self.register(node).extension(UnresolvedNodes)
    }

    fn register_page_info(self) -> Self {
        // See: https://relay.dev/graphql/connections.htm#sec-PageInfo
        let page_info = Object::new(PAGE_INFO)
            .description("Information about pagination in a connection.")
            .field(page_info_field(
                "hasNextPage",
                TypeRef::named_nn(TypeRef::BOOLEAN),
                "When paginating forwards, are there more items?",
                |info| Some(Value::from(info.has_next_page)),
            ))
            .field(page_info_field(
                "hasPreviousPage",
                TypeRef::named_nn(TypeRef::BOOLEAN),
                "When paginating backwards, are there more items?",
                |info| Some(Value::from(info.has_previous_page)),
            ))
            .field(page_info_field(
                "startCursor",
                TypeRef::named(TypeRef::STRING),
                "When paginating backwards, the cursor to continue.",
                |info| info.start_cursor.clone().map(Value::from),
            ))
            .field(page_info_field(
                "endCursor",
                TypeRef::named(TypeRef::STRING),
                "When paginating forwards, the cursor to continue.",
                |info| info.end_cursor.clone().map(Value::from),
            ));
        self.register(page_info)
    }

    fn register_connection<N>(self, config: ConnectionConfig) -> Self
    where
        N: Any + Send + Sync,
    {
        let edge_type = config.edge_type_name();
        let connection_type = config.connection_type_name();
        let node_type = config.node_type.clone().unwrap_or_else(|| config.name.clone());

        let mut edge = Object::new(edge_type.as_str())
            .description("An edge in a connection.")
            .field(
                Field::new("cursor", TypeRef::named_nn(TypeRef::STRING), |ctx| {
                    FieldFuture::new(async move {
                        let edge = ctx.parent_value.try_downcast_ref::<Edge<N>>()?;
                        Ok(Some(Value::from(edge.cursor.clone())))
                    })
                })
                .description("A cursor for use in pagination."),
            )
            .field(
                Field::new("node", TypeRef::named(node_type), |ctx| {
                    FieldFuture::new(async move {
                        let edge = ctx.parent_value.try_downcast_ref::<Edge<N>>()?;
                        Ok(Some(FieldValue::borrowed_any(&edge.node)))
                    })
                })
                .description("The item at the end of the edge"),
            );
        for field in config.edge_fields {
            edge = edge.field(field);
        }

        let mut connection = Object::new(connection_type.as_str())
            .description("A connection to a list of items.")
            .field(
                Field::new("edges", TypeRef::named_list(edge_type), |ctx| {
                    FieldFuture::new(async move {
                        let connection = ctx.parent_value.try_downcast_ref::<Connection<N>>()?;
                        Ok(Some(FieldValue::list(
                            connection.edges.iter().map(|edge| FieldValue::borrowed_any(edge)),
                        )))
                    })
                })
                .description("A list of edges."),
            )
            .field(
                Field::new("pageInfo", TypeRef::named_nn(PAGE_INFO), |ctx| {
                    FieldFuture::new(async move {
                        let connection = ctx.parent_value.try_downcast_ref::<Connection<N>>()?;
                        Ok(Some(FieldValue::borrowed_any(&connection.page_info)))
                    })
                })
                .description("Information to aid in pagination."),
            );
        for field in config.connection_fields {
            connection = connection.field(field);
        }

        self.register(edge).register(connection)
    }
}

fn page_info_field(
    name: &str,
    ty: TypeRef,
    description: &str,
    get: fn(&PageInfo) -> Option<Value>,
) -> Field {
    Field::new(name, ty, move |ctx| {
        FieldFuture::new(async move {
            let info = ctx.parent_value.try_downcast_ref::<PageInfo>()?;
            Ok(get(info))
        })
    })
    .description(description)
}

/// Renders unresolved `nodes` entries as `null`.
///
/// async-graphql resolves every item of an interface-typed list through
/// `FieldValue::WithType` and has no null item. [`nodes_field`] tags misses
/// with a type that implements no interface; this extension turns the item
/// error that tag produces back into `null`.
pub struct UnresolvedNodes;

impl ExtensionFactory for UnresolvedNodes {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(UnresolvedNodesExtension)
    }
}

struct UnresolvedNodesExtension;

#[async_trait]
impl Extension for UnresolvedNodesExtension {
    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        let is_node = info.return_type == NODE;
        match next.run(ctx, info).await {
            Err(err) if is_node && err.message.contains(UNRESOLVED_NODE) => Ok(None),
            resolved => resolved,
        }
    }
}

pub trait ObjectRelayExt {
    /// Implement `Node`, with an `id` field encoding the object's own type name
    /// and the local id returned by `id_fetcher`.
    fn implement_node<T, F>(self, id_fetcher: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> String + Send + Sync + 'static;
}

impl ObjectRelayExt for Object {
    fn implement_node<T, F>(self, id_fetcher: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let type_name = self.type_name().to_string();
        self.implement(NODE).field(global_id_field::<T, F>(type_name, id_fetcher))
    }
}

/// An `id: ID!` field resolving to the global ID of its parent `T`.
pub fn global_id_field<T, F>(type_name: impl Into<String>, id_fetcher: F) -> Field
where
    T: Any + Send + Sync,
    F: Fn(&T) -> String + Send + Sync + 'static,
{
    let type_name = type_name.into();
    Field::new("id", TypeRef::named_nn(TypeRef::ID), move |ctx| {
        let id = ctx
            .parent_value
            .try_downcast_ref::<T>()
            .map(|object| to_global_id(&type_name, id_fetcher(object)));
        FieldFuture::new(async move { Ok(Some(Value::from(id?))) })
    })
    .description("The ID of an object")
}

pub trait FieldRelayExt {
    /// Add `first`, `after`, `last` and `before`.
    /// See: https://relay.dev/graphql/connections.htm#sec-Arguments
    fn connection_arguments(self) -> Self;

    /// Add `first` and `after`.
    fn forward_connection_arguments(self) -> Self;

    /// Add `last` and `before`.
    fn backward_connection_arguments(self) -> Self;
}

impl FieldRelayExt for Field {
    fn connection_arguments(self) -> Self {
        self.forward_connection_arguments().backward_connection_arguments()
    }

    fn forward_connection_arguments(self) -> Self {
        self.argument(
            InputValue::new("first", TypeRef::named(TypeRef::INT))
                .description("Returns the first n elements from the list."),
        )
        .argument(InputValue::new("after", TypeRef::named(TypeRef::STRING)).description(
            "Returns the elements in the list that come after the specified cursor.",
        ))
    }

    fn backward_connection_arguments(self) -> Self {
        self.argument(
            InputValue::new("last", TypeRef::named(TypeRef::INT))
                .description("Returns the last n elements from the list."),
        )
        .argument(InputValue::new("before", TypeRef::named(TypeRef::STRING)).description(
            "Returns the elements in the list that come before the specified cursor.",
        ))
    }
}

/// Read the pagination arguments of a connection field.
///
/// When a [`PaginationConfig`] is registered as schema data the arguments are
/// validated against it.
pub fn parse_connection_arguments(
    ctx: &ResolverContext<'_>,
) -> async_graphql::Result<ConnectionArguments> {
    let args = ConnectionArguments {
        before: string_argument(&ctx.args, "before")?,
        after: string_argument(&ctx.args, "after")?,
        first: int_argument(&ctx.args, "first")?,
        last: int_argument(&ctx.args, "last")?,
    };

    if let Some(config) = ctx.data_opt::<PaginationConfig>() {
        args.validate(config)?;
    }
    Ok(args)
}

fn string_argument(
    args: &ObjectAccessor<'_>,
    name: &str,
) -> async_graphql::Result<Option<String>> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(Some(value.string()?.to_string())),
        _ => Ok(None),
    }
}

fn int_argument(args: &ObjectAccessor<'_>, name: &str) -> async_graphql::Result<Option<i32>> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(Some(i32::try_from(value.i64()?)?)),
        _ => Ok(None),
    }
}

/// Describe the field `ctx` is resolving.
pub fn request_info(ctx: &ResolverContext<'_>) -> RequestInfo {
    let field = ctx.field();
    RequestInfo {
        field_name: field.name().to_string(),
        alias: field.alias().map(str::to_string),
        path: ctx.path_node.map(|node| node.to_string_vec()).unwrap_or_default(),
        selection: field.selection_set().map(|selected| selected.name().to_string()).collect(),
    }
}

/// `node(id: ID!): Node`
///
/// `resolve_type` tags every resolved node with its concrete object type,
/// e.g. `FieldValue::owned_any(ship).with_type("Ship")`.
pub fn node_field<D, F, R>(definitions: NodeDefinitions<F>, resolve_type: R) -> Field
where
    D: Any + Send + Sync,
    F: NodeFetcher<D> + 'static,
    F::Error: Display,
    R: Fn(F::Node) -> FieldValue<'static> + Send + Sync + 'static,
{
    let resolve_type = Arc::new(resolve_type);
    Field::new("node", TypeRef::named(NODE), move |ctx| {
        let definitions = definitions.clone();
        let resolve_type = resolve_type.clone();
        FieldFuture::new(async move {
            let data = ctx.data::<D>()?;
            let info = request_info(&ctx);
            let id = ctx.args.try_get("id")?.string()?.to_string();
            let node = definitions
                .resolve_node(&id, data, &info)
                .await
                .map_err(|e| Error::new(e.to_string()))?;
            Ok(node.map(|node| (*resolve_type)(node)))
        })
    })
    .argument(
        InputValue::new("id", TypeRef::named_nn(TypeRef::ID)).description("The ID of an object"),
    )
    .description("Fetches an object given its ID")
}

/// `nodes(ids: [ID!]!): [Node]!`
///
/// Needs the extension installed by
/// [`register_node_interface`](SchemaBuilderRelayExt::register_node_interface)
/// to answer `null` entries.
pub fn nodes_field<D, F, R>(definitions: NodeDefinitions<F>, resolve_type: R) -> Field
where
    D: Any + Send + Sync,
    F: NodeFetcher<D> + 'static,
    F::Error: Display,
    R: Fn(F::Node) -> FieldValue<'static> + Send + Sync + 'static,
{
    let resolve_type = Arc::new(resolve_type);
    Field::new("nodes", TypeRef::named_list_nn(NODE), move |ctx| {
        let definitions = definitions.clone();
        let resolve_type = resolve_type.clone();
        FieldFuture::new(async move {
            let data = ctx.data::<D>()?;
            let info = request_info(&ctx);
            let ids = ctx
                .args
                .try_get("ids")?
                .list()?
                .iter()
                .map(|id| id.string().map(str::to_string))
                .collect::<async_graphql::Result<Vec<_>>>()?;
            let nodes = definitions
                .resolve_nodes(&ids, data, &info)
                .await
                .map_err(|e| Error::new(e.to_string()))?;
            Ok(Some(FieldValue::list(nodes.into_iter().map(|node| match node {
                Some(node) => (*resolve_type)(node),
                None => FieldValue::NULL.with_type(UNRESOLVED_NODE),
            }))))
        })
    })
    .argument(
        InputValue::new("ids", TypeRef::named_nn_list_nn(TypeRef::ID))
            .description("The IDs of objects"),
    )
    .description("Fetches objects given their IDs")
}

/// Build the input type, payload type and root field of a mutation.
///
/// The payload resolves to a [`MutationPayload`]; output fields read the
/// operation's result through [`payload_ref`].
pub fn mutation_definition<D, M>(
    field_name: impl Into<String>,
    mutation: ClientMutation<M>,
    config: MutationConfig,
) -> MutationDefinition
where
    D: Any + Send + Sync,
    M: MutateAndGetPayload<D> + 'static,
    M::Input: DeserializeOwned,
    M::Output: Any + Send + Sync,
    M::Error: Display,
{
    let input_name = mutation.input_type_name();
    let payload_name = mutation.payload_type_name();

    let mut input_type = InputObject::new(input_name.as_str());
    for field in config.input_fields {
        input_type = input_type.field(field);
    }
    input_type = input_type.field(
        InputValue::new(CLIENT_MUTATION_ID, TypeRef::named(TypeRef::STRING))
            .description("Echoed back unchanged in the mutation payload."),
    );

    let mut payload_type = Object::new(payload_name.as_str());
    for field in config.output_fields {
        payload_type = payload_type.field(field);
    }
    payload_type = payload_type.field(
        Field::new(CLIENT_MUTATION_ID, TypeRef::named(TypeRef::STRING), |ctx| {
            FieldFuture::new(async move {
                let payload = ctx.parent_value.try_downcast_ref::<MutationPayload<M::Output>>()?;
                Ok(payload.client_mutation_id.clone().map(Value::from))
            })
        })
        .description("The clientMutationId given in the mutation input."),
    );

    let field = Field::new(field_name, TypeRef::named(payload_name), move |ctx| {
        let mutation = mutation.clone();
        FieldFuture::new(async move {
            let data = ctx.data::<D>()?;
            let info = request_info(&ctx);
            let input = ctx.args.try_get("input")?.as_value().clone().into_json()?;
            let input: MutationInput<M::Input> = serde_json::from_value(input)?;
            let payload = mutation
                .resolve(input, data, &info)
                .await
                .map_err(|e| Error::new(e.to_string()))?;
            Ok(Some(FieldValue::owned_any(payload)))
        })
    })
    .argument(InputValue::new("input", TypeRef::named_nn(input_name)));

    MutationDefinition {
        input_type,
        payload_type,
        field,
    }
}

/// The operation output behind a mutation payload field.
pub fn payload_ref<'a, O>(ctx: &ResolverContext<'a>) -> async_graphql::Result<&'a O>
where
    O: Any + Send + Sync,
{
    let parent: &'a FieldValue<'a> = ctx.parent_value;
    Ok(&parent.try_downcast_ref::<MutationPayload<O>>()?.payload)
}
