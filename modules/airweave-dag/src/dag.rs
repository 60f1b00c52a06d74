//! The sync DAG's static shape (spec §3's `SyncDAG`): nodes typed as
//! source/entity/transformer/destination, edges routing entities between
//! them. Validated once at job start (spec §4.6).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use airweave_common::AirweaveError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DagNodeKind {
    Source { connection_id: Uuid },
    Entity { entity_definition_id: Uuid, entity_type: String },
    Transformer { method_reference: String },
    Destination { connection_id: Uuid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagNode {
    pub id: String,
    pub kind: DagNodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dag {
    pub id: Uuid,
    pub nodes: Vec<DagNode>,
    /// Declaration order matters: it is the tie-break order the router
    /// invokes multiple consumers of the same `(producer, entity_type)` in
    /// (spec §4.6).
    pub edges: Vec<(String, String)>,
}

impl Dag {
    pub fn node(&self, id: &str) -> Option<&DagNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Enforces spec §3's SyncDAG invariant: exactly one source node, at
    /// least one destination node, acyclic, and no transformer that
    /// produces the same entity type it consumes.
    pub fn validate(&self) -> Result<(), AirweaveError> {
        let source_count = self
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, DagNodeKind::Source { .. }))
            .count();
        if source_count != 1 {
            return Err(AirweaveError::Config(format!(
                "dag must have exactly one source node, found {source_count}"
            )));
        }

        let destination_count = self
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, DagNodeKind::Destination { .. }))
            .count();
        if destination_count == 0 {
            return Err(AirweaveError::Config("dag must have at least one destination node".into()));
        }

        self.check_acyclic()?;
        self.check_no_self_looping_transformers()?;
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), AirweaveError> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for (from, to) in &self.edges {
            adjacency.entry(from.as_str()).or_default().push(to.as_str());
        }

        #[derive(PartialEq, Eq, Clone, Copy)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = HashMap::new();

        fn visit<'a>(
            node: &'a str,
            adjacency: &HashMap<&'a str, Vec<&'a str>>,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<(), AirweaveError> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(AirweaveError::Config(format!("dag contains a cycle through node {node}")))
                }
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            if let Some(next) = adjacency.get(node) {
                for n in next {
                    visit(n, adjacency, marks)?;
                }
            }
            marks.insert(node, Mark::Done);
            Ok(())
        }

        for node in &self.nodes {
            visit(&node.id, &adjacency, &mut marks)?;
        }
        Ok(())
    }

    fn check_no_self_looping_transformers(&self) -> Result<(), AirweaveError> {
        for node in &self.nodes {
            let DagNodeKind::Transformer { method_reference } = &node.kind else {
                continue;
            };

            let input_types: HashSet<&str> = self
                .edges
                .iter()
                .filter(|(_, to)| to == &node.id)
                .filter_map(|(from, _)| self.node(from))
                .filter_map(|n| match &n.kind {
                    DagNodeKind::Entity { entity_type, .. } => Some(entity_type.as_str()),
                    _ => None,
                })
                .collect();

            let output_types: HashSet<&str> = self
                .edges
                .iter()
                .filter(|(from, _)| from == &node.id)
                .filter_map(|(_, to)| self.node(to))
                .filter_map(|n| match &n.kind {
                    DagNodeKind::Entity { entity_type, .. } => Some(entity_type.as_str()),
                    _ => None,
                })
                .collect();

            if input_types.intersection(&output_types).next().is_some() {
                return Err(AirweaveError::Config(format!(
                    "transformer {method_reference} produces a type it also consumes, which would loop"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: DagNodeKind) -> DagNode {
        DagNode { id: id.to_string(), kind }
    }

    fn entity_node(id: &str, entity_type: &str) -> DagNode {
        node(
            id,
            DagNodeKind::Entity {
                entity_definition_id: Uuid::nil(),
                entity_type: entity_type.to_string(),
            },
        )
    }

    #[test]
    fn valid_dag_passes() {
        let dag = Dag {
            id: Uuid::nil(),
            nodes: vec![
                node("src", DagNodeKind::Source { connection_id: Uuid::nil() }),
                entity_node("doc", "Document"),
                node(
                    "chunker",
                    DagNodeKind::Transformer { method_reference: "file_chunker".into() },
                ),
                entity_node("chunk", "FileChunk"),
                node("dst", DagNodeKind::Destination { connection_id: Uuid::nil() }),
            ],
            edges: vec![
                ("src".into(), "doc".into()),
                ("doc".into(), "chunker".into()),
                ("chunker".into(), "chunk".into()),
                ("chunk".into(), "dst".into()),
            ],
        };
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn rejects_missing_destination() {
        let dag = Dag {
            id: Uuid::nil(),
            nodes: vec![
                node("src", DagNodeKind::Source { connection_id: Uuid::nil() }),
                entity_node("doc", "Document"),
            ],
            edges: vec![("src".into(), "doc".into())],
        };
        assert!(dag.validate().is_err());
    }

    #[test]
    fn rejects_cycles() {
        let dag = Dag {
            id: Uuid::nil(),
            nodes: vec![
                node("src", DagNodeKind::Source { connection_id: Uuid::nil() }),
                entity_node("a", "A"),
                entity_node("b", "B"),
                node("dst", DagNodeKind::Destination { connection_id: Uuid::nil() }),
            ],
            edges: vec![
                ("src".into(), "a".into()),
                ("a".into(), "b".into()),
                ("b".into(), "a".into()),
                ("a".into(), "dst".into()),
            ],
        };
        assert!(dag.validate().is_err());
    }

    #[test]
    fn rejects_transformer_that_produces_its_own_input_type() {
        // `doc_in` and `doc_out` are distinct nodes so the node-id graph
        // itself stays acyclic; the rejection here must come from the
        // type-level check (entity_type "Document" in and out of
        // `normalize`), not from cycle detection.
        let dag = Dag {
            id: Uuid::nil(),
            nodes: vec![
                node("src", DagNodeKind::Source { connection_id: Uuid::nil() }),
                entity_node("doc_in", "Document"),
                node(
                    "normalize",
                    DagNodeKind::Transformer { method_reference: "normalize".into() },
                ),
                entity_node("doc_out", "Document"),
                node("dst", DagNodeKind::Destination { connection_id: Uuid::nil() }),
            ],
            edges: vec![
                ("src".into(), "doc_in".into()),
                ("doc_in".into(), "normalize".into()),
                ("normalize".into(), "doc_out".into()),
                ("doc_out".into(), "dst".into()),
            ],
        };
        assert!(dag.check_acyclic().is_ok());
        assert!(dag.validate().is_err());
    }
}
