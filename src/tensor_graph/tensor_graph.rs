use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::{
    instruction::instruction::Instruction,
    tensor::{NumericPrecision, Tensor, TensorDesc},
    utils::error::HarnessError,
};

// Unique identifier for a tensor operation
pub type OperationId = usize;

// Unique identifier for a tensor
pub type TensorId = usize;

#[derive(Clone, Debug)]
pub struct TensorGraph {
    pub name: String,
    pub tensors: Vec<TensorDesc>, // Indexed by TensorId
    pub operations: Vec<Box<dyn Instruction>>,

    // Tensors with fixed contents, bound before execution
    pub constants: BTreeMap<TensorId, Tensor>,

    // Graph entry and exit points
    pub input_tensors: Vec<TensorId>,
    pub output_tensors: Vec<TensorId>,
}

impl TensorGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tensors: Vec::new(),
            operations: Vec::new(),
            constants: BTreeMap::new(),
            input_tensors: Vec::new(),
            output_tensors: Vec::new(),
        }
    }

    pub fn next_tensor_id(&self) -> TensorId {
        self.tensors.len()
    }

    pub fn add_input(&mut self, desc: TensorDesc) -> TensorId {
        let id = self.tensors.len();
        self.tensors.push(desc);
        self.input_tensors.push(id);
        id
    }

    pub fn add_constant(&mut self, tensor: Tensor) -> TensorId {
        let id = self.tensors.len();
        self.tensors.push(tensor.desc.clone());
        self.constants.insert(id, tensor);
        id
    }

    /// Append an operation whose outputs are the next free tensor ids, in order.
    ///
    /// Output descriptors are inferred from the instruction, so every shape error
    /// surfaces here as a graph construction error.
    pub fn push_operation(
        &mut self,
        instruction: Box<dyn Instruction>,
    ) -> Result<OperationId, HarnessError> {
        let input_descs = instruction
            .get_input_tensor_ids()
            .iter()
            .map(|&id| self.desc(id))
            .collect::<Result<Vec<&TensorDesc>, HarnessError>>()
            .map_err(|e| HarnessError::GraphConstruction(e.to_string()))?;

        let output_descs = instruction.output_descs(&input_descs).map_err(|e| match e {
            HarnessError::GraphConstruction(_) => e,
            other => HarnessError::GraphConstruction(other.to_string()),
        })?;

        let outputs = instruction.get_output_tensor_ids();
        let expected: Vec<TensorId> =
            (self.tensors.len()..self.tensors.len() + output_descs.len()).collect();
        if outputs != expected {
            return Err(HarnessError::GraphConstruction(format!(
                "{} writes tensors {:?}, next free ids are {:?}",
                instruction.name(),
                outputs,
                expected
            )));
        }

        self.tensors.extend(output_descs);
        self.operations.push(instruction);
        Ok(self.operations.len() - 1)
    }

    pub fn mark_output(&mut self, id: TensorId) -> Result<(), HarnessError> {
        self.desc(id)?;
        if !self.output_tensors.contains(&id) {
            self.output_tensors.push(id);
        }
        Ok(())
    }

    pub fn desc(&self, id: TensorId) -> Result<&TensorDesc, HarnessError> {
        self.tensors
            .get(id)
            .ok_or_else(|| HarnessError::Execution(format!("Tensor {} is not in the graph", id)))
    }

    /// Precision of the first graph input.
    pub fn precision(&self) -> Option<NumericPrecision> {
        self.input_tensors
            .first()
            .and_then(|&id| self.tensors.get(id))
            .map(|d| d.precision())
    }

    pub fn single_output(&self) -> Result<TensorId, HarnessError> {
        match self.output_tensors.as_slice() {
            [id] => Ok(*id),
            other => Err(HarnessError::Execution(format!(
                "Graph '{}' has {} outputs, expected exactly one",
                self.name,
                other.len()
            ))),
        }
    }

    /// Stages of operations; everything in one stage only depends on earlier stages.
    pub fn create_execution_plan(&self) -> Result<Vec<Vec<OperationId>>, HarnessError> {
        let num_ops = self.operations.len();
        let mut successors: Vec<Vec<OperationId>> = vec![Vec::new(); num_ops];
        let mut in_degree: Vec<usize> = vec![0; num_ops];

        for (curr_op, instruction) in self.operations.iter().enumerate() {
            let mut preds = HashSet::new();
            for t in instruction.get_input_tensor_ids() {
                for pred_op in self.get_tensor_producers(t) {
                    if pred_op != curr_op && preds.insert(pred_op) {
                        successors[pred_op].push(curr_op);
                    }
                }
            }
            in_degree[curr_op] = preds.len();
        }

        // Kahn's algorithm
        let mut plan = Vec::new();
        let mut dq: VecDeque<OperationId> = (0..num_ops).filter(|&op| in_degree[op] == 0).collect();
        let mut scheduled = 0;
        while !dq.is_empty() {
            let mut stage = Vec::with_capacity(dq.len());
            for _ in 0..dq.len() {
                let Some(op) = dq.pop_front() else { break };
                stage.push(op);
                scheduled += 1;
                for &succ in &successors[op] {
                    in_degree[succ] -= 1;
                    if in_degree[succ] == 0 {
                        dq.push_back(succ);
                    }
                }
            }
            stage.sort_unstable();
            plan.push(stage);
        }

        if scheduled < num_ops {
            return Err(HarnessError::Execution(format!(
                "Could not schedule all operations: {}/{}",
                scheduled, num_ops
            )));
        }
        Ok(plan)
    }

    // Get all operations that produce a given tensor
    pub fn get_tensor_producers(&self, tensor_id: TensorId) -> Vec<OperationId> {
        self.operations
            .iter()
            .enumerate()
            .filter(|(_, op)| op.get_output_tensor_ids().contains(&tensor_id))
            .map(|(op_idx, _)| op_idx)
            .collect()
    }

    // Get all operations that consume a given tensor
    pub fn get_tensor_consumers(&self, tensor_id: TensorId) -> Vec<OperationId> {
        self.operations
            .iter()
            .enumerate()
            .filter(|(_, op)| op.get_input_tensor_ids().contains(&tensor_id))
            .map(|(op_idx, _)| op_idx)
            .collect()
    }

    /// Same tensors, constants, entry/exit points and operation parameters.
    pub fn is_equivalent(&self, other: &TensorGraph) -> bool {
        self.tensors == other.tensors
            && self.constants == other.constants
            && self.input_tensors == other.input_tensors
            && self.output_tensors == other.output_tensors
            && self.operations.len() == other.operations.len()
            && self
                .operations
                .iter()
                .zip(&other.operations)
                .all(|(a, b)| format!("{:?}", a) == format!("{:?}", b))
    }

    pub fn memory_requirements(&self) -> usize {
        self.tensors.iter().map(|desc| desc.size_in_bytes()).sum()
    }
}
