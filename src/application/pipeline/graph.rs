//! Directed acyclic graph of named pipeline stages with a minimal
//! topological scheduler.

use super::context::PipelineContext;
use crate::domain::errors::{GraphError, PipelineError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;
use tracing::info;

/// One named pipeline stage. Inputs and outputs move through the typed
/// slots of [`PipelineContext`]; `deps` names the stages whose outputs
/// this stage consumes.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn deps(&self) -> &'static [&'static str] {
        &[]
    }

    fn run(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError>;
}

#[derive(Default)]
pub struct StageGraph {
    stages: Vec<Box<dyn Stage>>,
    index: HashMap<&'static str, usize>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, stage: Box<dyn Stage>) -> Result<(), GraphError> {
        let name = stage.name();
        if self.index.contains_key(name) {
            return Err(GraphError::DuplicateStage {
                name: name.to_string(),
            });
        }
        self.index.insert(name, self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<usize, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownStage {
                name: name.to_string(),
            })
    }

    fn dep_indices(&self, idx: usize) -> Result<Vec<usize>, GraphError> {
        let stage = &self.stages[idx];
        stage
            .deps()
            .iter()
            .map(|dep| {
                self.index
                    .get(dep)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownDependency {
                        stage: stage.name().to_string(),
                        dep: dep.to_string(),
                    })
            })
            .collect()
    }

    /// Kahn's algorithm over the whole graph. Ties break in registration
    /// order, so the schedule is deterministic.
    fn topo_order(&self) -> Result<Vec<usize>, GraphError> {
        let n = self.stages.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for idx in 0..n {
            for dep in self.dep_indices(idx)? {
                in_degree[idx] += 1;
                dependents[dep].push(idx);
            }
        }

        let mut ready: VecDeque<usize> =
            (0..n).filter(|&idx| in_degree[idx] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(idx) = ready.pop_front() {
            order.push(idx);
            for &next in &dependents[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() < n {
            let stuck: Vec<String> = (0..n)
                .filter(|&idx| in_degree[idx] > 0)
                .map(|idx| self.stages[idx].name().to_string())
                .collect();
            return Err(GraphError::Cycle { stages: stuck });
        }
        Ok(order)
    }

    /// Transitive dependency closure of the selected stage names.
    fn closure(&self, selection: &[&str]) -> Result<HashSet<usize>, GraphError> {
        let mut wanted = HashSet::new();
        let mut pending: Vec<usize> = selection
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<_, _>>()?;

        while let Some(idx) = pending.pop() {
            if wanted.insert(idx) {
                pending.extend(self.dep_indices(idx)?);
            }
        }
        Ok(wanted)
    }

    /// The stages that would execute, in order, for a selection
    /// (`None` = the whole graph).
    pub fn plan(&self, selection: Option<&[&str]>) -> Result<Vec<&dyn Stage>, GraphError> {
        let order = self.topo_order()?;
        let wanted = match selection {
            Some(names) => Some(self.closure(names)?),
            None => None,
        };
        Ok(order
            .into_iter()
            .filter(|idx| wanted.as_ref().is_none_or(|w| w.contains(idx)))
            .map(|idx| self.stages[idx].as_ref())
            .collect())
    }

    /// Executes the plan sequentially; the first stage error aborts.
    pub fn run(
        &self,
        ctx: &mut PipelineContext,
        selection: Option<&[&str]>,
    ) -> Result<(), PipelineError> {
        let plan = self.plan(selection)?;
        let names: Vec<&str> = plan.iter().map(|s| s.name()).collect();
        info!("Execution plan: {}", names.join(" -> "));

        for stage in plan {
            let started = Instant::now();
            info!("Running stage '{}'", stage.name());
            stage.run(ctx)?;
            info!(
                "Stage '{}' finished in {:.2?}",
                stage.name(),
                started.elapsed()
            );
        }
        Ok(())
    }
}
