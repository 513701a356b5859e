//! Schema registry: the ordered, read-only set of variable specs.

use crate::{Error, Result, VarSpec};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ordered collection of variable specs.
///
/// Built once through [`SchemaBuilder`]; there is no mutation API
/// afterwards. Deferred defaults are evaluated on every read.
#[derive(Debug, Clone)]
pub struct Schema {
    specs: Vec<VarSpec>,
    index: HashMap<String, usize>,
    order: Vec<usize>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up a spec by name.
    pub fn get(&self, name: &str) -> Result<&VarSpec> {
        self.index
            .get(name)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// The raw default of `name`, evaluating a deferred default.
    pub fn default_of(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name)?.default.as_ref().map(|d| d.evaluate()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VarSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in the order they must be resolved: declaration order,
    /// adjusted so every variable comes after the ones it depends on.
    pub fn resolution_order(&self) -> impl Iterator<Item = &VarSpec> {
        self.order.iter().map(|&i| &self.specs[i])
    }
}

/// Declarative construction of a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    specs: Vec<VarSpec>,
    first: Vec<String>,
    precedes: Vec<(String, String)>,
}

impl SchemaBuilder {
    pub fn var(mut self, spec: VarSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Resolve `name` before every variable not also marked first.
    pub fn resolve_first(mut self, name: impl Into<String>) -> Self {
        self.first.push(name.into());
        self
    }

    /// Resolve `before` ahead of `after`.
    pub fn precedes(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.precedes.push((before.into(), after.into()));
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut index = HashMap::new();
        for (i, spec) in self.specs.iter().enumerate() {
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(Error::Duplicate(spec.name.clone()));
            }
        }

        let check_ref = |variable: &str, reference: &str| -> Result<usize> {
            index
                .get(reference)
                .copied()
                .ok_or_else(|| Error::UnknownReference {
                    variable: variable.to_string(),
                    reference: reference.to_string(),
                })
        };

        // deps[i] = indices that must be resolved before spec i
        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); self.specs.len()];
        for (i, spec) in self.specs.iter().enumerate() {
            for dep in spec.dependencies() {
                deps[i].push(check_ref(&spec.name, dep)?);
            }
        }
        for (before, after) in &self.precedes {
            let after_idx = check_ref(before, after)?;
            let before_idx = check_ref(after, before)?;
            deps[after_idx].push(before_idx);
        }
        let mut first = HashSet::new();
        for name in &self.first {
            first.insert(check_ref(name, name)?);
        }
        for (i, spec_deps) in deps.iter_mut().enumerate() {
            if !first.contains(&i) {
                spec_deps.extend(first.iter().copied());
            }
        }
        for spec_deps in deps.iter_mut() {
            spec_deps.sort_unstable();
            spec_deps.dedup();
        }

        if let Err(cycle) = detect_cycle(&self.specs, &deps) {
            return Err(Error::CycleDetected(cycle));
        }

        let order = stable_topological_order(&deps);
        debug!(
            variables = self.specs.len(),
            first = self.first.len(),
            "Schema built"
        );

        Ok(Schema {
            specs: self.specs,
            index,
            order,
        })
    }
}

/// Detect cycles in the dependency graph using DFS.
fn detect_cycle(specs: &[VarSpec], deps: &[Vec<usize>]) -> std::result::Result<(), String> {
    let mut visited = vec![false; specs.len()];
    let mut rec_stack = vec![false; specs.len()];

    for i in 0..specs.len() {
        if !visited[i] {
            if let Some(cycle) = dfs_detect_cycle(i, specs, deps, &mut visited, &mut rec_stack) {
                return Err(cycle);
            }
        }
    }
    Ok(())
}

fn dfs_detect_cycle(
    node: usize,
    specs: &[VarSpec],
    deps: &[Vec<usize>],
    visited: &mut [bool],
    rec_stack: &mut [bool],
) -> Option<String> {
    visited[node] = true;
    rec_stack[node] = true;

    for &dep in &deps[node] {
        if !visited[dep] {
            if let Some(cycle) = dfs_detect_cycle(dep, specs, deps, visited, rec_stack) {
                return Some(cycle);
            }
        } else if rec_stack[dep] {
            return Some(format!("{} -> {}", specs[node].name, specs[dep].name));
        }
    }

    rec_stack[node] = false;
    None
}

/// Topological order that keeps declaration order wherever the
/// dependencies allow it. The graph must be acyclic.
fn stable_topological_order(deps: &[Vec<usize>]) -> Vec<usize> {
    let mut done = vec![false; deps.len()];
    let mut order = Vec::with_capacity(deps.len());

    while order.len() < deps.len() {
        let next = (0..deps.len()).find(|&i| !done[i] && deps[i].iter().all(|&d| done[d]));
        match next {
            Some(i) => {
                done[i] = true;
                order.push(i);
            }
            None => break,
        }
    }
    order
}
