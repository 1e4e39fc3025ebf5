pub mod load;
mod types;

pub use load::{apply_env_overrides, load_default, load_from_path, validate};
pub use types::*;
