// The flow value: a tree of operations forming an executable program.
// Treated as opaque by the rest of the core except for equality and
// (de)serialization. The interpreter that actually evaluates these trees
// is out of scope; this is the smallest algebra that
// lets `InMemoryExecutor` run something real.

use serde::{Deserialize, Serialize};

use super::DynamicValue;
use crate::executor::ExecutorError;

/// A serializable description of a computation the executor can run.
/// Equality is structural on the serialized form (derived `PartialEq`
/// recurses through every constructor).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum FlowValue {
    /// Completes immediately with a success value.
    Succeed(DynamicValue),
    /// Completes immediately with a user-level failure value.
    Fail(DynamicValue),
    /// Completes immediately by dying with an executor error.
    Die(ExecutorError),
    /// Binds an input value into an inner flow before it runs.
    Provide {
        flow: Box<FlowValue>,
        input: DynamicValue,
    },
}

impl FlowValue {
    pub fn succeed(value: DynamicValue) -> Self {
        FlowValue::Succeed(value)
    }

    pub fn fail(value: DynamicValue) -> Self {
        FlowValue::Fail(value)
    }

    pub fn die(error: ExecutorError) -> Self {
        FlowValue::Die(error)
    }

    /// Binds `input` into `self`, logically `flow.provide(input)`.
    pub fn provide(self, input: DynamicValue) -> Self {
        FlowValue::Provide {
            flow: Box::new(self),
            input,
        }
    }
}
