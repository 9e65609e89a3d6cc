use once_cell::sync::Lazy;
use regex::Regex;

use crate::vars::VarMap;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)set\s+([A-Z_][A-Z0-9_]*)\s+to\s+["']?([^"'\n]+)["']?"#,
        r#"(?i)\b([A-Z_][A-Z0-9_]*)\s*:\s*["']?([^"'\n]+)["']?"#,
        r#"(?i)variable\s+([A-Z_][A-Z0-9_]*)\s*=\s*["']?([^"'\n]+)["']?"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("extraction regex"))
    .collect()
});

/// Best-effort extraction of `NAME: value` / `set NAME to value` pairs from
/// free text. First match per name wins and names already present in
/// `existing` are never overwritten. Heuristic only: a miss is silence, not
/// an error.
pub fn extract_variables(text: &str, existing: &VarMap) -> VarMap {
    let mut extracted = VarMap::new();
    for pattern in PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let name = caps[1].trim().to_string();
            let value = caps[2].trim().to_string();
            if value.is_empty() || existing.contains_key(&name) || extracted.contains_key(&name) {
                continue;
            }
            extracted.insert(name, value);
        }
    }
    extracted
}
