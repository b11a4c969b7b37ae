// Flow values and dynamic values (C4): the opaque, serializable program
// representation and its typed runtime value.

mod dynamic;
mod value;

pub use dynamic::{DynamicValue, Schema};
pub use value::FlowValue;
