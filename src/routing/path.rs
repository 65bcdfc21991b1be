//! Path segmentation and reserved top-level names.

/// Top-level names of an application's source folders. Never routed, never served.
pub const RESERVED_NAMES: [&str; 4] = ["controllers", "views", "models", "emails"];

/// Action used when the path names none.
pub const DEFAULT_ACTION: &str = "Index";

/// Split a request path into its non-empty segments.
///
/// Any query string or fragment is dropped first, so
/// `/test/index/a/?q=1#top` yields `["test", "index", "a"]`.
pub fn split_segments(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a segment names a reserved folder (ASCII case-insensitive).
pub fn is_reserved(segment: &str) -> bool {
    RESERVED_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(segment))
}

/// Split action segments into the action name and its parameters.
pub fn split_action(segments: &[String]) -> (&str, &[String]) {
    match segments.split_first() {
        Some((action, params)) => (action.as_str(), params),
        None => (DEFAULT_ACTION, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments() {
        assert_eq!(
            split_segments("/test/index/param1/param2?qs=value#frag"),
            vec!["test", "index", "param1", "param2"]
        );
        assert_eq!(split_segments("//a///b/"), vec!["a", "b"]);
        assert!(split_segments("/").is_empty());
        assert!(split_segments("").is_empty());
        assert!(split_segments("/?only=query").is_empty());
    }

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved("controllers"));
        assert!(is_reserved("Views"));
        assert!(is_reserved("MODELS"));
        assert!(is_reserved("emails"));
        assert!(!is_reserved("downloads"));
        assert!(!is_reserved("view"));
    }

    #[test]
    fn test_split_action() {
        let segments = vec!["Edit".to_string(), "7".to_string(), "draft".to_string()];
        let (action, params) = split_action(&segments);
        assert_eq!(action, "Edit");
        assert_eq!(params, ["7".to_string(), "draft".to_string()]);

        let (action, params) = split_action(&[]);
        assert_eq!(action, DEFAULT_ACTION);
        assert!(params.is_empty());
    }
}
