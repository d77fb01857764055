//! Node graph execution engine
//!
//! This module cooks nodes on demand:
//! - Snapshotting the upstream closure of a target so the graph can keep
//!   changing while the cook runs
//! - Memoized, generation-checked results per node
//! - Slot-ordered upstream cooking, optionally on parallel scoped threads
//! - Failure isolation, including operators that panic

use crate::config::EngineConfig;
use crate::error::{EvaluationError, SopError, SopResult, SystemError, TopologyError};
use crate::geometry::Geometry;
use crate::kernels::Kernels;
use crate::nodes::cache::{CacheStatistics, CookCell, CookStart};
use crate::nodes::graph::{NodeGraph, SharedGraph};
use crate::nodes::interface::{CookContext, SopOperator};
use crate::nodes::parameters::ParameterSet;
use crate::nodes::{NodeId, NodeType};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Represents the cook state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeState {
    /// Needs to be cooked before its result can be used
    Dirty,
    /// A cook is in flight
    Cooking,
    /// Cached result matches the node's current generation
    Clean,
}

/// Frozen view of one node taken when a cook starts
struct PlannedNode {
    title: String,
    node_type: NodeType,
    operator: Arc<dyn SopOperator>,
    parameters: ParameterSet,
    inputs: Vec<Option<NodeId>>,
    required: usize,
    generation: u64,
    cell: Arc<CookCell>,
}

/// Snapshot of everything a cook of one target needs
///
/// A plan holds no reference to the graph. Results it produces are stored
/// under the generations it captured, so if the graph changes while the
/// plan executes those results are already stale.
pub struct CookPlan {
    target: NodeId,
    nodes: HashMap<NodeId, PlannedNode>,
}

impl CookPlan {
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Number of nodes in the snapshot, target included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Execution engine for node graphs
pub struct NodeGraphEngine {
    config: EngineConfig,
    kernels: Kernels,
    statistics: Mutex<CacheStatistics>,
}

impl NodeGraphEngine {
    /// Create an engine with default configuration and the reference kernels
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_kernels(config, Kernels::default())
    }

    pub fn with_kernels(config: EngineConfig, kernels: Kernels) -> Self {
        Self {
            config,
            kernels,
            statistics: Mutex::new(CacheStatistics::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn kernels(&self) -> &Kernels {
        &self.kernels
    }

    /// Snapshot the upstream closure of `target`
    pub fn plan(&self, graph: &NodeGraph, target: NodeId) -> SopResult<CookPlan> {
        let mut nodes = HashMap::new();
        for id in graph.cook_closure(target)? {
            let node = graph.node(id)?;
            nodes.insert(
                id,
                PlannedNode {
                    title: node.title().to_string(),
                    node_type: node.node_type(),
                    operator: node.operator.clone(),
                    parameters: node.parameters().clone(),
                    inputs: node.inputs().iter().map(|s| s.map(|s| s.node)).collect(),
                    required: node.input_config().required,
                    generation: node.generation(),
                    cell: node.cook.clone(),
                },
            );
        }
        Ok(CookPlan { target, nodes })
    }

    /// Cook a previously taken snapshot
    pub fn execute(&self, plan: &CookPlan) -> SopResult<Arc<Geometry>> {
        self.cook_node(plan, plan.target, &[])
    }

    /// Cook `target`, reusing every still-valid cached result upstream
    pub fn cook(&self, graph: &NodeGraph, target: NodeId) -> SopResult<Arc<Geometry>> {
        let plan = self.plan(graph, target)?;
        self.execute(&plan)
    }

    /// Cook against a shared graph, holding its lock only while planning
    pub fn cook_shared(&self, graph: &SharedGraph, target: NodeId) -> SopResult<Arc<Geometry>> {
        let plan = {
            let guard = graph.read();
            self.plan(&guard, target)?
        };
        self.execute(&plan)
    }

    /// Cook several targets in order; one failure does not stop the rest
    pub fn cook_many(&self, graph: &NodeGraph, targets: &[NodeId]) -> Vec<SopResult<Arc<Geometry>>> {
        targets.iter().map(|&id| self.cook(graph, id)).collect()
    }

    fn cook_node(&self, plan: &CookPlan, id: NodeId, path: &[NodeId]) -> SopResult<Arc<Geometry>> {
        if path.contains(&id) {
            return Err(TopologyError::CycleDetected {
                node: id,
                upstream: path.last().copied().unwrap_or(id),
            }
            .into());
        }
        let planned = plan.nodes.get(&id).ok_or(SystemError::UnknownNode(id))?;

        let ticket = match planned.cell.begin(id, planned.generation) {
            CookStart::Cached(geometry) => {
                self.record(|s| s.cache_hits += 1);
                return Ok(geometry);
            }
            CookStart::Failed(err) => return Err(err),
            CookStart::Begin { ticket, replaced_stale } => {
                self.record(|s| {
                    s.cache_misses += 1;
                    if replaced_stale {
                        s.cache_invalidations += 1;
                    }
                });
                ticket
            }
        };

        let connected = planned.inputs.iter().flatten().count();
        if connected < planned.required {
            let err = SopError::from(TopologyError::InsufficientInputs {
                node: id,
                connected,
                required: planned.required,
            });
            ticket.fail(err.clone());
            return Err(err);
        }

        let mut child_path = path.to_vec();
        child_path.push(id);
        let inputs = match self.cook_inputs(plan, &planned.inputs, &child_path) {
            Ok(inputs) => inputs,
            Err(err) => {
                ticket.fail(err.clone());
                return Err(err);
            }
        };

        let ctx = CookContext {
            node_id: id,
            title: &planned.title,
            parameters: &planned.parameters,
            inputs,
            kernels: &self.kernels,
        };
        debug!("Cooking node {} ({})", id, planned.node_type);
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| planned.operator.compute(&ctx)));
        let elapsed = started.elapsed();

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(EvaluationError::OperationFailed(format!(
                "operator panicked: {}",
                panic_message(payload.as_ref())
            ))),
        };

        match result {
            Ok(geometry) => {
                let geometry = Arc::new(geometry);
                ticket.succeed(geometry.clone());
                self.record(|s| {
                    s.cooks += 1;
                    s.total_cook_time += elapsed;
                });
                debug!(
                    "Cooked node {} in {:?}: {} points, {} primitives",
                    id,
                    elapsed,
                    geometry.point_count(),
                    geometry.primitive_count()
                );
                Ok(geometry)
            }
            Err(error) => {
                warn!("Node {} ({}) failed to cook: {}", id, planned.node_type, error);
                let err = SopError::evaluation(id, error);
                ticket.fail(err.clone());
                self.record(|s| s.failed_cooks += 1);
                Err(err)
            }
        }
    }

    /// Cook connected inputs; results and the reported error follow slot order
    fn cook_inputs(
        &self,
        plan: &CookPlan,
        inputs: &[Option<NodeId>],
        path: &[NodeId],
    ) -> SopResult<Vec<Option<Arc<Geometry>>>> {
        let connected: Vec<(usize, NodeId)> = inputs
            .iter()
            .enumerate()
            .filter_map(|(slot, upstream)| upstream.map(|u| (slot, u)))
            .collect();
        let mut results: Vec<Option<Arc<Geometry>>> = vec![None; inputs.len()];

        if !self.config.parallel_branches || connected.len() < 2 {
            for (slot, upstream) in connected {
                results[slot] = Some(self.cook_node(plan, upstream, path)?);
            }
            return Ok(results);
        }

        for chunk in connected.chunks(self.config.max_branch_threads.max(1)) {
            let outcomes: Vec<SopResult<Arc<Geometry>>> = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|&(_, upstream)| {
                        (upstream, scope.spawn(move || self.cook_node(plan, upstream, path)))
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|(upstream, handle)| {
                        handle.join().unwrap_or_else(|payload| {
                            Err(SopError::evaluation(
                                upstream,
                                EvaluationError::OperationFailed(panic_message(payload.as_ref())),
                            ))
                        })
                    })
                    .collect()
            });
            for (&(slot, _), outcome) in chunk.iter().zip(outcomes) {
                results[slot] = Some(outcome?);
            }
        }
        Ok(results)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStatistics)) {
        if self.config.track_statistics {
            update(&mut self.statistics.lock());
        }
    }

    pub fn node_state(&self, graph: &NodeGraph, id: NodeId) -> SopResult<NodeState> {
        Ok(graph.node(id)?.state())
    }

    pub fn cook_count(&self, graph: &NodeGraph, id: NodeId) -> SopResult<u64> {
        Ok(graph.node(id)?.cook_count())
    }

    pub fn last_error(&self, graph: &NodeGraph, id: NodeId) -> SopResult<Option<SopError>> {
        Ok(graph.node(id)?.last_error())
    }

    /// Drop every cached result in the graph; returns how many were dropped
    pub fn invalidate_all(&self, graph: &NodeGraph) -> usize {
        let dropped = graph.nodes().filter(|node| node.cook.invalidate()).count();
        self.record(|s| s.cache_invalidations += dropped);
        dropped
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.statistics.lock().clone()
    }

    pub fn reset_statistics(&self) {
        *self.statistics.lock() = CacheStatistics::default();
    }

    /// Get execution statistics for `graph`
    pub fn stats(&self, graph: &NodeGraph) -> ExecutionStats {
        let mut stats = ExecutionStats::default();
        for node in graph.nodes() {
            stats.total_nodes += 1;
            match node.state() {
                NodeState::Clean => stats.clean_nodes += 1,
                NodeState::Dirty => stats.dirty_nodes += 1,
                NodeState::Cooking => stats.cooking_nodes += 1,
            }
            if node.state() != NodeState::Clean && node.last_error().is_some() {
                stats.error_nodes += 1;
            }
        }
        stats
    }
}

impl Default for NodeGraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the cook state of a graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    pub total_nodes: usize,
    pub clean_nodes: usize,
    pub dirty_nodes: usize,
    pub cooking_nodes: usize,
    /// Dirty nodes whose last cook failed
    pub error_nodes: usize,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{NodeCategory, NodeMetadata, NodeRegistryBuilder, InputConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sequential() -> NodeGraphEngine {
        NodeGraphEngine::with_config(EngineConfig {
            parallel_branches: false,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_second_cook_is_cache_hit() {
        let mut graph = NodeGraph::default();
        let sphere = graph.create_node("Sphere").unwrap();
        let engine = sequential();

        let first = engine.cook(&graph, sphere).unwrap();
        let second = engine.cook(&graph, sphere).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cook_count(&graph, sphere).unwrap(), 1);
        assert_eq!(engine.cache_statistics().cache_hits, 1);
    }

    #[test]
    fn test_panicking_operator_becomes_operation_failed() {
        let mut builder = NodeRegistryBuilder::new();
        builder
            .register_with(
                NodeMetadata::new(NodeType::new("Explode"), "Explode", NodeCategory::utility(), "panics"),
                || {
                    Arc::new(|_: &CookContext<'_>| -> Result<Geometry, EvaluationError> {
                        panic!("kernel exploded")
                    }) as Arc<dyn SopOperator>
                },
            )
            .unwrap();
        let mut graph = NodeGraph::new(Arc::new(builder.build()));
        let id = graph.create_node("Explode").unwrap();
        let engine = sequential();

        let err = engine.cook(&graph, id).unwrap_err();
        match err {
            SopError::Evaluation { node, error: EvaluationError::OperationFailed(msg) } => {
                assert_eq!(node, id);
                assert!(msg.contains("kernel exploded"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(engine.node_state(&graph, id).unwrap(), NodeState::Dirty);
        assert!(engine.last_error(&graph, id).unwrap().is_some());
    }

    #[test]
    fn test_parallel_inputs_keep_slot_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut builder = NodeRegistryBuilder::new();
        let c = counter.clone();
        builder
            .register_with(
                NodeMetadata::new(NodeType::new("Count"), "Count", NodeCategory::utility(), "counts")
                    .with_parameters(vec![crate::nodes::ParameterDescriptor::int("tag", "Tag", 0)]),
                move || {
                    let c = c.clone();
                    Arc::new(move |ctx: &CookContext<'_>| -> Result<Geometry, EvaluationError> {
                        c.fetch_add(1, Ordering::SeqCst);
                        let tag = ctx.parameters.int("tag")? as f32;
                        let mut g = Geometry::new();
                        g.add_point(glam::Vec3::splat(tag));
                        Ok(g)
                    }) as Arc<dyn SopOperator>
                },
            )
            .unwrap();
        builder
            .register_with(
                NodeMetadata::new(NodeType::new("Join"), "Join", NodeCategory::utility(), "joins")
                    .with_inputs(InputConfig::multiple(2, None, 1)),
                || {
                    Arc::new(|ctx: &CookContext<'_>| -> Result<Geometry, EvaluationError> {
                        let mut out = Geometry::new();
                        for g in ctx.connected_inputs() {
                            out.append(g).map_err(EvaluationError::InvalidGeometry)?;
                        }
                        Ok(out)
                    }) as Arc<dyn SopOperator>
                },
            )
            .unwrap();

        let mut graph = NodeGraph::new(Arc::new(builder.build()));
        let join = graph.create_node("Join").unwrap();
        for slot in 0..6 {
            let n = graph.create_node("Count").unwrap();
            graph.set_parameter(n, "tag", slot as i64).unwrap();
            graph.connect(join, slot, n, 0).unwrap();
        }

        let engine = NodeGraphEngine::with_config(EngineConfig {
            parallel_branches: true,
            max_branch_threads: 4,
            track_statistics: true,
        });
        let result = engine.cook(&graph, join).unwrap();
        let xs: Vec<f32> = result.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_invalidate_all_marks_everything_dirty() {
        let mut graph = NodeGraph::default();
        let sphere = graph.create_node("Sphere").unwrap();
        let engine = sequential();
        engine.cook(&graph, sphere).unwrap();
        assert_eq!(engine.stats(&graph).clean_nodes, 1);
        assert_eq!(engine.invalidate_all(&graph), 1);
        assert_eq!(engine.node_state(&graph, sphere).unwrap(), NodeState::Dirty);
        engine.cook(&graph, sphere).unwrap();
        assert_eq!(engine.cook_count(&graph, sphere).unwrap(), 2);
    }
}
