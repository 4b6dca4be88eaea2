//! Property-based tests for formae-mcp
//!
//! These tests verify invariants that must hold for all inputs:
//! - The config scanner never panics
//! - Only values inside `cli { api { ... } }` are picked up
//! - Explicit overrides always win over the config file
//! - Tool argument validation never panics
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// CONFIG SCANNER TESTS
// ============================================================================

mod config_tests {
    use super::*;
    use formae_mcp::config::{parse_cli_api, AgentEndpoint, EndpointOverrides};

    fn url_strategy() -> impl Strategy<Value = String> {
        "https?://[a-z][a-z0-9-]{0,20}(\\.[a-z]{2,5}){0,2}"
    }

    fn port_strategy() -> impl Strategy<Value = String> {
        (1u32..65536).prop_map(|p| p.to_string())
    }

    proptest! {
        /// Invariant: parse_cli_api never panics on any input
        #[test]
        fn never_panics(s in "\\PC*") {
            let _ = parse_cli_api(&s);
        }

        /// Invariant: unbalanced braces never panic either
        #[test]
        fn never_panics_on_braces(s in "[{}a-z =\"\n]{0,200}") {
            let _ = parse_cli_api(&s);
        }

        /// Invariant: values in a well-formed cli.api block are found exactly
        #[test]
        fn finds_cli_api_values(url in url_strategy(), port in port_strategy()) {
            let content = format!(
                "amends \"formae:/Config.pkl\"\n\ncli {{\n    api {{\n        url = \"{}\"\n        port = {}\n    }}\n}}\n",
                url, port
            );
            let api = parse_cli_api(&content);
            prop_assert_eq!(api.url, Some(url));
            prop_assert_eq!(api.port, Some(port));
        }

        /// Invariant: url/port in sibling blocks are never picked up
        #[test]
        fn ignores_sibling_blocks(
            block in "(agent|plugins|server|network)",
            url in url_strategy(),
            port in port_strategy(),
        ) {
            let content = format!(
                "{} {{\n    api {{\n        url = \"{}\"\n        port = {}\n    }}\n}}\ncli {{\n    disableUsageReporting = true\n}}\n",
                block, url, port
            );
            let api = parse_cli_api(&content);
            prop_assert_eq!(api.url, None);
            prop_assert_eq!(api.port, None);
        }

        /// Invariant: commented-out lines contribute nothing
        #[test]
        fn ignores_comments(url in url_strategy(), port in port_strategy()) {
            let content = format!(
                "cli {{\n    api {{\n        // url = \"{}\"\n        // port = {}\n    }}\n}}\n",
                url, port
            );
            prop_assert_eq!(parse_cli_api(&content).url, None);
            prop_assert_eq!(parse_cli_api(&content).port, None);
        }

        /// Invariant: non-empty overrides beat whatever the file says
        #[test]
        fn overrides_win(
            file_url in url_strategy(),
            file_port in port_strategy(),
            env_url in url_strategy(),
            env_port in port_strategy(),
        ) {
            let content = format!(
                "cli {{\n    api {{\n        url = \"{}\"\n        port = {}\n    }}\n}}\n",
                file_url, file_port
            );
            let endpoint = AgentEndpoint::resolve_from(
                Some(&content),
                &EndpointOverrides {
                    url: Some(env_url.clone()),
                    port: Some(env_port.clone()),
                },
            );
            prop_assert_eq!(endpoint.url, env_url);
            prop_assert_eq!(endpoint.port, env_port);
        }
    }
}

// ============================================================================
// TOOL ARGUMENT VALIDATION TESTS
// ============================================================================

mod validation_tests {
    use super::*;
    use formae_mcp::mcp::{validate_arguments, TOOL_DEFINITIONS};
    use serde_json::json;

    proptest! {
        /// Invariant: validation never panics, whatever the tool name
        #[test]
        fn never_panics(name in "\\PC{0,40}", value in "\\PC{0,40}") {
            let _ = validate_arguments(&name, &json!({ "query": value }));
        }

        /// Invariant: string values for declared string properties always pass
        #[test]
        fn string_queries_accepted(query in "\\PC{0,80}") {
            let args = json!({ "query": query });
            for tool in ["list_resources", "list_targets", "cancel_commands", "extract_resources"] {
                let accepted = validate_arguments(tool, &args).is_ok();
                prop_assert!(accepted, "{} rejected a string query", tool);
            }
        }

        /// Invariant: non-object arguments are always rejected
        #[test]
        fn non_objects_rejected(n in any::<i64>(), idx in 0usize..16) {
            let (name, _, _, _) = TOOL_DEFINITIONS[idx % TOOL_DEFINITIONS.len()];
            let scalar_rejected = validate_arguments(name, &json!(n)).is_err();
            let array_rejected = validate_arguments(name, &json!([n])).is_err();
            prop_assert!(scalar_rejected, "{} accepted a number", name);
            prop_assert!(array_rejected, "{} accepted an array", name);
        }
    }
}
