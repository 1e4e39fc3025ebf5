mod model;
mod parser;

pub use model::FailureRecord;
pub use parser::{
    decode_failures, parse, runner_error_record, MISSING_ARTIFACT_MESSAGE, UNKNOWN_ERROR,
    UNKNOWN_REQUEST,
};
