mod descriptor;
mod iteration;

pub use descriptor::{DescriptorBuilder, RunDescriptor};
pub use iteration::{iteration_payload, IterationData, AUTH_TOKEN_VAR, BASE_URL_VAR};
