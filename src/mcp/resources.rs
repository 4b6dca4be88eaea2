//! Static documentation resources

use super::protocol::{ResourceContents, ResourceDefinition};

pub const QUERY_SYNTAX_URI: &str = "formae://docs/query-syntax";
pub const CONCEPTS_URI: &str = "formae://docs/concepts";

const MARKDOWN: &str = "text/markdown";

/// uri, name, description, markdown body
const RESOURCES: &[(&str, &str, &str, &str)] = &[
    (
        QUERY_SYNTAX_URI,
        "Formae Query Syntax",
        "Reference documentation for formae's Bluge-based query syntax used to filter resources, targets, and commands.",
        include_str!("docs/query-syntax.md"),
    ),
    (
        CONCEPTS_URI,
        "Formae Core Concepts",
        "Overview of formae's core concepts: stacks, targets, resources, formas, modes, drift, and discovery.",
        include_str!("docs/concepts.md"),
    ),
];

pub fn list_resources() -> Vec<ResourceDefinition> {
    RESOURCES
        .iter()
        .map(|(uri, name, description, _)| ResourceDefinition {
            uri: uri.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            mime_type: MARKDOWN.to_string(),
        })
        .collect()
}

/// Contents for `uri`, or `None` if no such resource exists
pub fn read_resource(uri: &str) -> Option<ResourceContents> {
    RESOURCES
        .iter()
        .find(|(u, _, _, _)| *u == uri)
        .map(|(uri, _, _, body)| ResourceContents {
            uri: uri.to_string(),
            mime_type: MARKDOWN.to_string(),
            text: body.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list() {
        let resources = list_resources();
        assert_eq!(resources.len(), 2);
        assert!(resources.iter().all(|r| r.mime_type == "text/markdown"));
    }

    #[test]
    fn test_read_query_syntax() {
        let doc = read_resource(QUERY_SYNTAX_URI).unwrap();
        assert!(doc.text.starts_with("# Formae Query Syntax"));
        for field in ["| stack |", "| namespace |", "| client |"] {
            assert!(doc.text.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_read_concepts() {
        let doc = read_resource(CONCEPTS_URI).unwrap();
        assert!(doc.text.contains("### Patch Mode"));
        assert!(doc.text.contains("pending, in_progress, completed, failed, canceled"));
    }

    #[test]
    fn test_unknown_uri() {
        assert!(read_resource("formae://docs/nope").is_none());
    }
}
