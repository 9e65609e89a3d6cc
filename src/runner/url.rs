use url::form_urlencoded;

use crate::collection::{UrlParts, UrlSpec};
use crate::vars::{substitute, VarMap};

/// Builds the final request URL from either URL shape.
///
/// A raw string (bare or inside the structured form) wins outright. The
/// structured form needs both host and path; anything less degrades to an
/// empty string so the dispatcher can report the request as failed instead
/// of the walk aborting.
pub fn build_url(url: Option<&UrlSpec>, vars: &VarMap) -> String {
    match url {
        None => String::new(),
        Some(UrlSpec::Raw(raw)) => substitute(raw, vars),
        Some(UrlSpec::Detailed(parts)) => build_from_parts(parts, vars),
    }
}

fn build_from_parts(parts: &UrlParts, vars: &VarMap) -> String {
    if let Some(raw) = &parts.raw {
        return substitute(raw, vars);
    }

    let (Some(host), Some(path)) = (&parts.host, &parts.path) else {
        return String::new();
    };

    let mut url = match &parts.protocol {
        Some(protocol) => format!("{protocol}://"),
        None => String::from("http://"),
    };
    url.push_str(&host.join("."));

    if let Some(port) = &parts.port {
        url.push(':');
        url.push_str(&port.to_string());
    }

    let path = path.join("/");
    if !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(&path);

    let query = parts
        .query
        .iter()
        .filter_map(|param| match (&param.key, &param.value) {
            (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                Some(format!("{key}={}", encode_query_value(value)))
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("&");
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    substitute(&url, vars)
}

// form_urlencoded writes spaces as '+'; query values here are
// percent-encoded, so normalize. Literal '+' is already "%2B" by the
// time this runs.
fn encode_query_value(value: &str) -> String {
    let serialized: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    serialized.replace('+', "%20")
}
