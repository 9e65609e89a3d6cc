use std::collections::HashMap;

/// Flat variable map resolved against `{{name}}` placeholders.
pub type VarMap = HashMap<String, String>;

mod extract;
mod loader;
mod substitution;

pub use extract::extract_variables;
pub use loader::{environment_from_value, load_environment_file, parse_environment};
pub use substitution::substitute;
