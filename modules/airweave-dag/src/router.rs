//! DAG Router (spec §4.6): at job start, builds a `(producer_node_id,
//! entity_type) -> [consumer_node]` map from the validated DAG, then
//! routes each entity produced by the source through transformers until
//! it reaches a destination node, where it is handed to an
//! `EntityFinalizer` for ledger diffing and emission. Ported from
//! `original_source/backend/app/platform/sync/router.py`'s recursive
//! routing loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use airweave_common::AirweaveError;
use airweave_entity::Entity;
use airweave_transform::TransformerRegistry;

use crate::dag::{Dag, DagNodeKind};

/// Finalizes an entity that has reached a destination node — materializing
/// lazy operations, embedding, diffing against the ledger, and emitting
/// the resulting action are all orchestrator-level concerns (spec §4.6
/// step 2), so the router only owns the routing decision and defers the
/// rest through this trait.
#[async_trait]
pub trait EntityFinalizer: Send + Sync {
    async fn finalize(&self, destination_node_id: &str, entity: Entity) -> Result<(), AirweaveError>;
}

pub struct DagRouter {
    dag: Dag,
    routes: HashMap<(String, String), Vec<String>>,
    transformers: Arc<TransformerRegistry>,
}

impl DagRouter {
    pub fn new(dag: Dag, transformers: Arc<TransformerRegistry>) -> Result<Self, AirweaveError> {
        dag.validate()?;

        // Every entity-typed node sits between its producers (source or
        // transformer nodes with an edge into it) and its consumers
        // (transformer or destination nodes with an edge out of it). The
        // routing table is keyed by (producer_id, entity_type) so
        // `route_entity` can look up where to send an entity using only the
        // node that emitted it and the entity's own type (spec §4.6).
        let mut routes: HashMap<(String, String), Vec<String>> = HashMap::new();
        for entity_node in &dag.nodes {
            let DagNodeKind::Entity { entity_type, .. } = &entity_node.kind else {
                continue;
            };
            let producers = dag.edges.iter().filter(|(_, to)| to == &entity_node.id).map(|(from, _)| from);
            let consumers: Vec<String> = dag
                .edges
                .iter()
                .filter(|(from, _)| from == &entity_node.id)
                .map(|(_, to)| to.clone())
                .collect();
            for producer in producers {
                routes
                    .entry((producer.clone(), entity_type.clone()))
                    .or_default()
                    .extend(consumers.iter().cloned());
            }
        }

        Ok(Self { dag, routes, transformers })
    }

    /// Route `entity`, produced by `producer_node_id`, to every matching
    /// consumer in declared edge order (spec §4.6's tie-break rule).
    pub async fn route_entity(
        &self,
        producer_node_id: &str,
        entity: Entity,
        finalizer: &dyn EntityFinalizer,
    ) -> Result<(), AirweaveError> {
        let key = (producer_node_id.to_string(), entity.entity_type.clone());
        let Some(consumers) = self.routes.get(&key) else {
            tracing::debug!(
                producer = producer_node_id,
                entity_type = %entity.entity_type,
                "no consumer registered for this (producer, entity_type); entity dropped"
            );
            return Ok(());
        };

        for consumer_id in consumers {
            let Some(consumer_node) = self.dag.node(consumer_id) else { continue };
            match &consumer_node.kind {
                DagNodeKind::Transformer { method_reference } => {
                    let transformer = self.transformers.get(method_reference).ok_or_else(|| {
                        AirweaveError::Config(format!("no transformer registered under name {method_reference}"))
                    })?;
                    let produced = transformer.transform(entity.clone()).await?;
                    for next_entity in produced {
                        Box::pin(self.route_entity(consumer_id, next_entity, finalizer)).await?;
                    }
                }
                DagNodeKind::Destination { .. } => {
                    finalizer.finalize(consumer_id, entity.clone()).await?;
                }
                DagNodeKind::Source { .. } | DagNodeKind::Entity { .. } => {
                    tracing::debug!(node = consumer_id, "routing target is not a transformer or destination; skipped");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use airweave_entity::Provenance;
    use airweave_transform::Transformer;
    use uuid::Uuid;

    use super::*;
    use crate::dag::DagNode;

    fn provenance() -> Provenance {
        Provenance {
            source_name: "test".into(),
            sync_id: Uuid::nil(),
            sync_job_id: Uuid::nil(),
            source_connection_id: Uuid::nil(),
        }
    }

    struct RecordingFinalizer {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EntityFinalizer for RecordingFinalizer {
        async fn finalize(&self, destination_node_id: &str, entity: Entity) -> Result<(), AirweaveError> {
            self.seen
                .lock()
                .unwrap()
                .push((destination_node_id.to_string(), entity.entity_id.clone()));
            Ok(())
        }
    }

    fn passthrough_dag() -> Dag {
        Dag {
            id: Uuid::nil(),
            nodes: vec![
                DagNode {
                    id: "src".into(),
                    kind: DagNodeKind::Source { connection_id: Uuid::nil() },
                },
                DagNode {
                    id: "doc".into(),
                    kind: DagNodeKind::Entity {
                        entity_definition_id: Uuid::nil(),
                        entity_type: "Document".into(),
                    },
                },
                DagNode {
                    id: "dst".into(),
                    kind: DagNodeKind::Destination { connection_id: Uuid::nil() },
                },
            ],
            edges: vec![("src".into(), "doc".into()), ("doc".into(), "dst".into())],
        }
    }

    #[tokio::test]
    async fn routes_entity_straight_to_destination_when_no_transformer() {
        let transformers = Arc::new(TransformerRegistry::new());
        let router = DagRouter::new(passthrough_dag(), transformers).unwrap();
        let finalizer = RecordingFinalizer { seen: Mutex::new(Vec::new()) };

        let entity = Entity::new("e1", "Document", provenance());
        router.route_entity("src", entity, &finalizer).await.unwrap();

        let seen = finalizer.seen.lock().unwrap();
        assert_eq!(*seen, vec![("dst".to_string(), "e1".to_string())]);
    }

    #[tokio::test]
    async fn unrouted_entity_type_is_dropped_without_error() {
        let transformers = Arc::new(TransformerRegistry::new());
        let router = DagRouter::new(passthrough_dag(), transformers).unwrap();
        let finalizer = RecordingFinalizer { seen: Mutex::new(Vec::new()) };

        let entity = Entity::new("e1", "SomethingElse", provenance());
        router.route_entity("src", entity, &finalizer).await.unwrap();
        assert!(finalizer.seen.lock().unwrap().is_empty());
    }

    /// Renames the entity type, the same way `file_chunker` turns a
    /// `DriveFile` into `FileChunk` entities — a transformer that changes
    /// type is how chunking-style transforms stay DAG-routable without
    /// tripping the consumes-what-it-produces rejection.
    struct RenamingTransformer;

    #[async_trait]
    impl Transformer for RenamingTransformer {
        fn name(&self) -> &str {
            "rename_to_file_chunk"
        }

        async fn transform(&self, mut entity: Entity) -> Result<Vec<Entity>, AirweaveError> {
            entity.entity_type = "FileChunk".to_string();
            Ok(vec![entity])
        }
    }

    #[tokio::test]
    async fn routes_through_a_transformer_before_reaching_destination() {
        let dag = Dag {
            id: Uuid::nil(),
            nodes: vec![
                DagNode {
                    id: "src".into(),
                    kind: DagNodeKind::Source { connection_id: Uuid::nil() },
                },
                DagNode {
                    id: "doc".into(),
                    kind: DagNodeKind::Entity {
                        entity_definition_id: Uuid::nil(),
                        entity_type: "Document".into(),
                    },
                },
                DagNode {
                    id: "chunker".into(),
                    kind: DagNodeKind::Transformer { method_reference: "rename_to_file_chunk".into() },
                },
                DagNode {
                    id: "chunk".into(),
                    kind: DagNodeKind::Entity {
                        entity_definition_id: Uuid::nil(),
                        entity_type: "FileChunk".into(),
                    },
                },
                DagNode {
                    id: "dst".into(),
                    kind: DagNodeKind::Destination { connection_id: Uuid::nil() },
                },
            ],
            edges: vec![
                ("src".into(), "doc".into()),
                ("doc".into(), "chunker".into()),
                ("chunker".into(), "chunk".into()),
                ("chunk".into(), "dst".into()),
            ],
        };

        let mut registry = TransformerRegistry::new();
        registry.register(Arc::new(RenamingTransformer));
        let router = DagRouter::new(dag, Arc::new(registry)).unwrap();
        let finalizer = RecordingFinalizer { seen: Mutex::new(Vec::new()) };

        let entity = Entity::new("e1", "Document", provenance());
        router.route_entity("src", entity, &finalizer).await.unwrap();

        let seen = finalizer.seen.lock().unwrap();
        assert_eq!(*seen, vec![("dst".to_string(), "e1".to_string())]);
    }
}
