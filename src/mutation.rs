//! Relay mutations with a client mutation ID
//!
//! Every Relay mutation takes a single `input` argument carrying an optional
//! `clientMutationId` and returns a payload echoing it back. The id is a
//! correlation token for the client: it is never generated, interpreted or
//! deduplicated here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::request::RequestInfo;

/// Mutation input: the caller's fields plus `clientMutationId`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationInput<I> {
    #[serde(default)]
    pub client_mutation_id: Option<String>,
    #[serde(flatten)]
    pub fields: I,
}

impl<I> MutationInput<I> {
    pub fn new(client_mutation_id: Option<String>, fields: I) -> Self {
        Self {
            client_mutation_id,
            fields,
        }
    }
}

/// Mutation payload: the caller's output plus the echoed `clientMutationId`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationPayload<O> {
    pub client_mutation_id: Option<String>,
    #[serde(flatten)]
    pub payload: O,
}

/// The business operation behind a mutation.
///
/// Receives the input fields without `clientMutationId`, the caller's context
/// and the [`RequestInfo`] of the mutation field. Errors are returned to the
/// caller of [`ClientMutation::resolve`] untouched.
#[async_trait]
pub trait MutateAndGetPayload<C>: Send + Sync
where
    C: Send + Sync + ?Sized,
{
    type Input: Send;
    type Output: Send;
    type Error: Send;

    async fn mutate_and_get_payload(
        &self,
        input: Self::Input,
        ctx: &C,
        info: &RequestInfo,
    ) -> Result<Self::Output, Self::Error>;
}

/// [`MutateAndGetPayload`] backed by a closure returning a future.
pub struct MutationFn<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

/// Wrap a closure as a [`MutateAndGetPayload`] operation.
pub fn mutation_fn<F, I>(f: F) -> MutationFn<F, I> {
    MutationFn {
        f,
        _input: PhantomData,
    }
}

#[async_trait]
impl<C, F, Fut, I, O, E> MutateAndGetPayload<C> for MutationFn<F, I>
where
    C: Send + Sync + ?Sized,
    F: Fn(I, &C, &RequestInfo) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, E>> + Send,
    I: Send + 'static,
    O: Send,
    E: Send,
{
    type Input = I;
    type Output = O;
    type Error = E;

    async fn mutate_and_get_payload(&self, input: I, ctx: &C, info: &RequestInfo) -> Result<O, E> {
        (self.f)(input, ctx, info).await
    }
}

/// A named mutation wrapping its business operation
pub struct ClientMutation<M> {
    name: String,
    operation: Arc<M>,
}

impl<M> ClientMutation<M> {
    pub fn new(name: impl Into<String>, operation: M) -> Self {
        Self {
            name: name.into(),
            operation: Arc::new(operation),
        }
    }

    /// Mutation name, the prefix of its `Input` and `Payload` types
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_type_name(&self) -> String {
        format!("{}Input", self.name)
    }

    pub fn payload_type_name(&self) -> String {
        format!("{}Payload", self.name)
    }

    /// Run the operation and echo the client mutation ID into its payload.
    pub async fn resolve<C>(
        &self,
        input: MutationInput<M::Input>,
        ctx: &C,
        info: &RequestInfo,
    ) -> Result<MutationPayload<M::Output>, M::Error>
    where
        C: Send + Sync + ?Sized,
        M: MutateAndGetPayload<C>,
    {
        let MutationInput {
            client_mutation_id,
            fields,
        } = input;

        let payload = self.operation.mutate_and_get_payload(fields, ctx, info).await?;

        tracing::debug!(
            mutation = %self.name,
            client_mutation_id = client_mutation_id.as_deref(),
            "mutation completed"
        );
        Ok(MutationPayload {
            client_mutation_id,
            payload,
        })
    }
}

impl<M> Clone for ClientMutation<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            operation: self.operation.clone(),
        }
    }
}

/// Shorthand for [`ClientMutation::new`].
pub fn mutation_with_client_mutation_id<M>(
    name: impl Into<String>,
    operation: M,
) -> ClientMutation<M> {
    ClientMutation::new(name, operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SimpleInput {
        input: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SimpleOutput {
        result: i64,
    }

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct NoInput {}

    #[derive(Debug, PartialEq)]
    struct Rejected(&'static str);

    struct Counter {
        total: AtomicI64,
    }

    impl Counter {
        fn starting_at(total: i64) -> Self {
            Self {
                total: AtomicI64::new(total),
            }
        }
    }

    struct AddToCounter;

    #[async_trait]
    impl MutateAndGetPayload<Counter> for AddToCounter {
        type Input = SimpleInput;
        type Output = SimpleOutput;
        type Error = Rejected;

        async fn mutate_and_get_payload(
            &self,
            input: SimpleInput,
            counter: &Counter,
            _info: &RequestInfo,
        ) -> Result<SimpleOutput, Rejected> {
            if input.input < 0 {
                return Err(Rejected("negative increment"));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            let result = counter.total.fetch_add(input.input, Ordering::SeqCst) + input.input;
            Ok(SimpleOutput { result })
        }
    }

    fn info() -> RequestInfo {
        RequestInfo::new("addToCounter")
    }

    fn input(client_mutation_id: &str, input: i64) -> MutationInput<SimpleInput> {
        MutationInput::new(Some(client_mutation_id.to_string()), SimpleInput { input })
    }

    #[tokio::test]
    async fn test_echoes_client_mutation_id() {
        let mutation = mutation_with_client_mutation_id(
            "SimpleMutation",
            mutation_fn(|_: NoInput, _: &(), _: &RequestInfo| async {
                Ok::<_, Rejected>(SimpleOutput { result: 1 })
            }),
        );

        let payload = mutation
            .resolve(MutationInput::new(Some("abc".to_string()), NoInput {}), &(), &info())
            .await
            .unwrap();
        assert_eq!(payload.client_mutation_id.as_deref(), Some("abc"));
        assert_eq!(payload.payload, SimpleOutput { result: 1 });
    }

    #[tokio::test]
    async fn test_missing_client_mutation_id_is_null() {
        let mutation = ClientMutation::new(
            "SimpleMutationWithInput",
            mutation_fn(|input: SimpleInput, _: &(), _: &RequestInfo| async move {
                Ok::<_, Rejected>(SimpleOutput {
                    result: input.input,
                })
            }),
        );

        let payload = mutation
            .resolve(MutationInput::new(None, SimpleInput { input: 5 }), &(), &info())
            .await
            .unwrap();
        assert_eq!(payload.client_mutation_id, None);
        assert_eq!(payload.payload.result, 5);
    }

    #[tokio::test]
    async fn test_async_operation_with_context() {
        let mutation = ClientMutation::new("AddToCounter", AddToCounter);
        let counter = Counter::starting_at(10);

        let payload = mutation.resolve(input("first", 5), &counter, &info()).await.unwrap();
        assert_eq!(payload.client_mutation_id.as_deref(), Some("first"));
        assert_eq!(payload.payload.result, 15);

        let payload = mutation.resolve(input("second", 1), &counter, &info()).await.unwrap();
        assert_eq!(payload.client_mutation_id.as_deref(), Some("second"));
        assert_eq!(payload.payload.result, 16);
    }

    #[tokio::test]
    async fn test_operation_receives_request_info() {
        let mutation = ClientMutation::new(
            "WhoAmI",
            mutation_fn(|_: NoInput, _: &(), info: &RequestInfo| {
                let key = info.response_key().to_string();
                async move { Ok::<_, Rejected>(key) }
            }),
        );
        let info = RequestInfo {
            alias: Some("me".to_string()),
            ..RequestInfo::new("whoAmI")
        };

        let payload = mutation
            .resolve(MutationInput::new(None, NoInput {}), &(), &info)
            .await
            .unwrap();
        assert_eq!(payload.payload, "me");
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        let mutation = ClientMutation::new("AddToCounter", AddToCounter);
        let counter = Counter::starting_at(0);

        let result = mutation.resolve(input("abc", -1), &counter, &info()).await;
        assert_eq!(result, Err(Rejected("negative increment")));
        assert_eq!(counter.total.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_identical_ids_are_not_deduplicated() {
        let mutation = ClientMutation::new("AddToCounter", AddToCounter);
        let counter = Counter::starting_at(0);

        for _ in 0..2 {
            mutation.resolve(input("same", 2), &counter, &info()).await.unwrap();
        }
        assert_eq!(counter.total.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_type_names() {
        let mutation = ClientMutation::new("IntroduceShip", AddToCounter);
        assert_eq!(mutation.name(), "IntroduceShip");
        assert_eq!(mutation.input_type_name(), "IntroduceShipInput");
        assert_eq!(mutation.payload_type_name(), "IntroduceShipPayload");
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::json!({ "clientMutationId": "abc", "input": 5 });
        let parsed: MutationInput<SimpleInput> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, input("abc", 5));

        let json = serde_json::json!({ "input": 5 });
        let parsed: MutationInput<SimpleInput> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.client_mutation_id, None);

        let payload = MutationPayload {
            client_mutation_id: Some("abc".to_string()),
            payload: SimpleOutput { result: 1 },
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({ "clientMutationId": "abc", "result": 1 })
        );
    }
}
