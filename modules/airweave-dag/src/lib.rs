//! The DAG Router component (spec §4.6 / C7): the static shape of a
//! sync's transformer graph and the routing algorithm that walks it.

pub mod dag;
pub mod router;

pub use dag::{Dag, DagNode, DagNodeKind};
pub use router::{DagRouter, EntityFinalizer};
