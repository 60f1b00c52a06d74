use std::future::Future;
use std::pin::Pin;

use airweave_common::AirweaveError;

use crate::entity::Entity;

type LazyFuture<'a> = Pin<Box<dyn Future<Output = Result<serde_json::Value, AirweaveError>> + Send + 'a>>;

/// A deferred operation attached to a `LazyEntity` (spec §9): a named,
/// boxed async closure captured by the source adapter at enumeration time.
/// Keeping the producer cheap and paying expensive per-item API calls
/// inside the worker pool is the whole point of this type.
pub trait LazyOperation: Send + Sync {
    fn name(&self) -> &str;
    fn run<'a>(&'a self, entity: &'a Entity) -> LazyFuture<'a>;
}

/// An entity that carries operations to run during worker materialization
/// rather than during source enumeration.
pub struct LazyEntity {
    pub base: Entity,
    pub operations: Vec<Box<dyn LazyOperation>>,
}

impl LazyEntity {
    pub fn new(base: Entity) -> Self {
        Self {
            base,
            operations: Vec::new(),
        }
    }

    pub fn with_operation(mut self, op: Box<dyn LazyOperation>) -> Self {
        self.operations.push(op);
        self
    }

    /// Run every deferred operation concurrently (bounded by the worker's
    /// own budget, not the pool's — spec §9) and fold each result back into
    /// the entity's payload under its operation name, then return the
    /// materialized plain `Entity`.
    pub async fn materialize(mut self) -> Result<Entity, AirweaveError> {
        let futures = self
            .operations
            .iter()
            .map(|op| async move { (op.name().to_string(), op.run(&self.base).await) });
        let results = futures::future::join_all(futures).await;

        for (name, result) in results {
            let value = result?;
            self.base.payload.insert(name, value);
        }
        Ok(self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airweave_common::AirweaveError;
    use uuid::Uuid;

    struct Double;

    impl LazyOperation for Double {
        fn name(&self) -> &str {
            "doubled"
        }
        fn run<'a>(&'a self, entity: &'a Entity) -> LazyFuture<'a> {
            Box::pin(async move {
                let n = entity.payload.get("n").and_then(|v| v.as_i64()).unwrap_or(0);
                Ok::<_, AirweaveError>(serde_json::json!(n * 2))
            })
        }
    }

    #[tokio::test]
    async fn materialize_writes_results_back_into_payload() {
        let prov = crate::provenance::Provenance {
            source_name: "test".into(),
            sync_id: Uuid::nil(),
            sync_job_id: Uuid::nil(),
            source_connection_id: Uuid::nil(),
        };
        let mut base = Entity::new("e1", "Thing", prov);
        base.payload.insert("n".into(), serde_json::json!(21));

        let lazy = LazyEntity::new(base).with_operation(Box::new(Double));
        let materialized = lazy.materialize().await.unwrap();
        assert_eq!(materialized.payload.get("doubled"), Some(&serde_json::json!(42)));
    }
}
