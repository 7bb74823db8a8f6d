//! The graph that owns variables and the operations connecting them.
//!
//! Variables and `Apply` nodes live in one petgraph `StableDiGraph` so that
//! indices stay valid across rewrites. Edges run input -> apply (weighted by
//! input position) and apply -> output (weighted by output index).
use super::error::GraphError;
use super::variable::{ApplyId, Owner, Variable, VariableId};
use crate::types::TypeRef;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// One application of an operation to input variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub op: String,
    inputs: Vec<VariableId>,
    outputs: Vec<VariableId>,
}

impl Apply {
    pub fn inputs(&self) -> &[VariableId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[VariableId] {
        &self.outputs
    }
}

#[derive(Debug, Clone)]
enum GraphNode {
    Variable(Variable),
    Apply(Apply),
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    dag: StableDiGraph<GraphNode, usize>,
    index: HashMap<VariableId, NodeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a free (unowned) variable, typically a graph input.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId, GraphError> {
        let id = variable.id();
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateVariable(id));
        }
        if variable.owner().is_some() {
            return Err(GraphError::AlreadyOwned(id));
        }
        let node = self.dag.add_node(GraphNode::Variable(variable));
        self.index.insert(id, node);
        Ok(id)
    }

    /// Applies `op` to `inputs`, creating one output variable per entry of
    /// `output_types`. Outputs record the new apply as their owner.
    pub fn apply(
        &mut self,
        op: impl Into<String>,
        inputs: &[VariableId],
        output_types: &[TypeRef],
    ) -> Result<ApplyId, GraphError> {
        let input_nodes = inputs
            .iter()
            .map(|&id| self.node_of(id))
            .collect::<Result<Vec<_>, _>>()?;

        let apply_node = self.dag.add_node(GraphNode::Apply(Apply {
            op: op.into(),
            inputs: inputs.to_vec(),
            outputs: Vec::with_capacity(output_types.len()),
        }));
        let apply = ApplyId(apply_node);
        for (position, &input) in input_nodes.iter().enumerate() {
            self.dag.add_edge(input, apply_node, position);
        }

        let mut outputs = Vec::with_capacity(output_types.len());
        for (index, ty) in output_types.iter().enumerate() {
            let variable = ty.var().with_owner(Owner { apply, index });
            let id = variable.id();
            let node = self.dag.add_node(GraphNode::Variable(variable));
            self.dag.add_edge(apply_node, node, index);
            self.index.insert(id, node);
            outputs.push(id);
        }
        if let Some(GraphNode::Apply(a)) = self.dag.node_weight_mut(apply_node) {
            a.outputs = outputs;
        }
        Ok(apply)
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        match self.dag.node_weight(*self.index.get(&id)?) {
            Some(GraphNode::Variable(v)) => Some(v),
            _ => None,
        }
    }

    /// Mutable access for renaming. The type of a variable cannot change.
    pub fn variable_mut(&mut self, id: VariableId) -> Option<&mut Variable> {
        match self.dag.node_weight_mut(*self.index.get(&id)?) {
            Some(GraphNode::Variable(v)) => Some(v),
            _ => None,
        }
    }

    pub fn apply_node(&self, id: ApplyId) -> Option<&Apply> {
        match self.dag.node_weight(id.0) {
            Some(GraphNode::Apply(a)) => Some(a),
            _ => None,
        }
    }

    /// The operation that produced `id`, if any.
    pub fn owner_of(&self, id: VariableId) -> Option<&Apply> {
        self.apply_node(self.variable(id)?.owner()?.apply)
    }

    /// Every `(apply, input position)` consuming `id`.
    pub fn clients(&self, id: VariableId) -> Vec<(ApplyId, usize)> {
        let Some(&node) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut clients: Vec<_> = self
            .dag
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (ApplyId(e.target()), *e.weight()))
            .collect();
        clients.sort();
        clients
    }

    pub fn variable_count(&self) -> usize {
        self.index.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.dag.node_weights().filter_map(|n| match n {
            GraphNode::Variable(v) => Some(v),
            GraphNode::Apply(_) => None,
        })
    }

    /// Redirects every use of `old` to `new`.
    ///
    /// Refuses when the two variables' types are not equal, since consumers
    /// of `old` were built against its type. Returns the number of rewired uses.
    pub fn replace(&mut self, old: VariableId, new: VariableId) -> Result<usize, GraphError> {
        let old_node = self.node_of(old)?;
        let new_node = self.node_of(new)?;
        let (old_ty, new_ty) = match (self.variable(old), self.variable(new)) {
            (Some(o), Some(n)) => (o.ty().clone(), n.ty().clone()),
            _ => return Err(GraphError::UnknownVariable(old)),
        };
        if old_ty != new_ty {
            return Err(GraphError::TypeMismatch {
                old,
                new,
                old_ty: old_ty.to_string(),
                new_ty: new_ty.to_string(),
            });
        }

        let uses: Vec<_> = self
            .dag
            .edges_directed(old_node, Direction::Outgoing)
            .map(|e| (e.id(), e.target(), *e.weight()))
            .collect();
        let cycles = uses
            .iter()
            .any(|&(_, client, _)| has_path_connecting(&self.dag, client, new_node, None));
        if cycles {
            return Err(GraphError::WouldCycle { old, new });
        }

        for &(edge, client, position) in &uses {
            self.dag.remove_edge(edge);
            self.dag.add_edge(new_node, client, position);
            if let Some(GraphNode::Apply(a)) = self.dag.node_weight_mut(client) {
                a.inputs[position] = new;
            }
        }
        tracing::debug!(%old, %new, uses = uses.len(), ty = %old_ty, "replaced variable");
        Ok(uses.len())
    }

    /// Apply nodes ordered so that every producer precedes its consumers.
    pub fn topological_order(&self) -> Result<Vec<ApplyId>, GraphError> {
        let order = toposort(&self.dag, None).map_err(|_| GraphError::Cycle)?;
        Ok(order
            .into_iter()
            .filter(|&n| matches!(self.dag.node_weight(n), Some(GraphNode::Apply(_))))
            .map(ApplyId)
            .collect())
    }

    fn node_of(&self, id: VariableId) -> Result<NodeIndex, GraphError> {
        self.index.get(&id).copied().ok_or(GraphError::UnknownVariable(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{double, ArrayType, DowncastPolicy, ScalarType};
    use crate::value::DType;

    fn add_graph() -> (Graph, VariableId, VariableId, ApplyId) {
        let mut graph = Graph::new();
        let x = graph.add_variable(double().make_variable(Some("x"))).unwrap();
        let y = graph.add_variable(double().make_variable(Some("y"))).unwrap();
        let add = graph.apply("add", &[x, y], &[double()]).unwrap();
        (graph, x, y, add)
    }

    #[test]
    fn test_outputs_observe_their_owner() {
        let (graph, x, y, add) = add_graph();
        let out = graph.apply_node(add).unwrap().outputs()[0];
        let owner = graph.variable(out).unwrap().owner().unwrap();
        assert_eq!(owner, Owner { apply: add, index: 0 });
        assert_eq!(graph.owner_of(out).unwrap().op, "add");
        assert!(graph.owner_of(x).is_none());
        assert_eq!(graph.clients(y), vec![(add, 1)]);
        assert_eq!(graph.variable_count(), 3);
    }

    #[test]
    fn test_unknown_input() {
        let mut graph = Graph::new();
        let stray = double().var();
        let err = graph.apply("neg", &[stray.id()], &[double()]).unwrap_err();
        assert_eq!(err, GraphError::UnknownVariable(stray.id()));
    }

    #[test]
    fn test_duplicate_and_owned_variables_rejected() {
        let (mut graph, x, _, add) = add_graph();
        let x_var = graph.variable(x).unwrap().clone();
        assert_eq!(graph.add_variable(x_var), Err(GraphError::DuplicateVariable(x)));

        let out = graph.variable(graph.apply_node(add).unwrap().outputs()[0]).unwrap().clone();
        let mut other = Graph::new();
        assert_eq!(other.add_variable(out.clone()), Err(GraphError::AlreadyOwned(out.id())));
    }

    #[test]
    fn test_replace_requires_equal_types() {
        let (mut graph, x, _, add) = add_graph();
        let same = graph.add_variable(double().var()).unwrap();
        let scalar = TypeRef::new(ScalarType::with_policy(DType::Float64, DowncastPolicy::Deny));
        let other = graph.add_variable(scalar.var()).unwrap();

        let err = graph.replace(x, other).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));

        assert_eq!(graph.replace(x, same), Ok(1));
        assert_eq!(graph.apply_node(add).unwrap().inputs()[0], same);
        assert!(graph.clients(x).is_empty());
    }

    #[test]
    fn test_replace_with_structurally_equal_type() {
        let vector = || {
            TypeRef::new(ArrayType::with_policy(DType::Float32, &[false], DowncastPolicy::Deny))
        };
        let mut graph = Graph::new();
        let a = graph.add_variable(vector().var()).unwrap();
        let b = graph.add_variable(vector().var()).unwrap();
        graph.apply("exp", &[a], &[vector()]).unwrap();
        assert_eq!(graph.replace(a, b), Ok(1));
    }

    #[test]
    fn test_replace_refuses_cycles() {
        let (mut graph, x, _, add) = add_graph();
        let out = graph.apply_node(add).unwrap().outputs()[0];
        assert_eq!(graph.replace(x, out), Err(GraphError::WouldCycle { old: x, new: out }));
    }

    #[test]
    fn test_topological_order() {
        let (mut graph, _, y, add) = add_graph();
        let sum = graph.apply_node(add).unwrap().outputs()[0];
        let mul = graph.apply("mul", &[sum, y], &[double()]).unwrap();
        assert_eq!(graph.topological_order().unwrap(), vec![add, mul]);
    }

    #[test]
    fn test_rename_through_graph() {
        let (mut graph, x, _, _) = add_graph();
        graph.variable_mut(x).unwrap().set_name(Some("input".into()));
        assert_eq!(graph.variable(x).unwrap().name(), Some("input"));
        assert_eq!(graph.variable(x).unwrap().ty(), &double());
    }
}
