use once_cell::sync::Lazy;
use regex::Regex;

use crate::vars::VarMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder regex"));

/// Replaces every `{{name}}` occurrence whose name exists in `vars`.
/// Unknown placeholders stay verbatim so partially configured environments
/// still produce a usable request. Single left-to-right pass; replacement
/// values are never re-scanned.
pub fn substitute(input: &str, vars: &VarMap) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
