//! Guided workflow prompts

use serde_json::{Map, Value};

use super::protocol::{GetPromptResult, PromptArgument, PromptDefinition};
use crate::error::{FormaeError, Result};

/// name, description, arguments as (name, description, required)
const PROMPTS: &[(&str, &str, &[(&str, &str, bool)])] = &[
    (
        "check_drift",
        "Check for infrastructure drift and help resolve it. Shows sync drift (out-of-band changes) and patch drift (unreconciled patches).",
        &[],
    ),
    (
        "discover_resources",
        "Find unmanaged resources in cloud accounts that aren't managed by formae yet.",
        &[],
    ),
    (
        "import_resources",
        "Bring one or more unmanaged resources under formae management.",
        &[(
            "query",
            "Optional query to filter which unmanaged resources to import (e.g., 'type:AWS::S3::Bucket')",
            false,
        )],
    ),
    (
        "deploy_infrastructure",
        "Apply a forma file to deploy or update infrastructure with simulation and confirmation.",
        &[("file_path", "Path to the forma file to apply", true)],
    ),
    (
        "patch_infrastructure",
        "Make an urgent targeted change to infrastructure without a full reconcile. Use for incident response.",
        &[],
    ),
    (
        "build_plugin",
        "Build a new formae resource plugin from scratch using the plugin SDK tutorial.",
        &[(
            "provider",
            "The cloud provider or technology to build a plugin for (e.g., 'cloudflare', 'datadog')",
            true,
        )],
    ),
    (
        "add_resource_type",
        "Add support for a new resource type to an existing formae plugin.",
        &[(
            "resource_type",
            "The resource type to add support for (e.g., 'DNS::Record', 'Compute::Instance')",
            true,
        )],
    ),
];

const CHECK_DRIFT: &str = "Check my infrastructure for drift. Use list_drift to see out-of-band changes per stack, and list_changes_since_last_reconcile for everything modified since the last reconcile. Use get_agent_stats for resource counts.

Show me:
1. Any out-of-band changes detected by the agent's continuous synchronization
2. Any patches that haven't been reconciled yet

For each piece of drift found, help me decide whether to:
- Overwrite: undo the change by force-reconciling
- Absorb: incorporate the change into my IaC codebase
- Extract to file: save the current state as PKL for manual review

Group drift by stack and process one stack at a time.";

const DISCOVER_RESOURCES: &str = "Find all unmanaged resources in my cloud infrastructure. Start with get_agent_stats to see unmanaged counts by provider, then use list_resources with 'managed:false' combined with a type filter to see what the formae agent has discovered.

Present the results grouped by resource type, showing:
- Resource type and label
- Key properties
- Which target/account they belong to

Help me decide which resources to bring under management.";

const IMPORT_RESOURCES_STEPS: &str = "For each resource or group of resources I select:
1. Extract the resource as PKL infrastructure code
2. Either:
   a. Help me incorporate it into my existing IaC codebase following its patterns and conventions
   b. Or save it as a standalone forma file

If incorporating into an existing codebase:
- Assign to an appropriate stack
- Follow existing naming conventions
- Verify by running apply --mode reconcile --simulate
- Loop until the simulation shows only the expected \"bring under management\" changes";

const DEPLOY_STEPS: &str = "Please follow this workflow:
1. First, simulate the apply (--simulate) to preview changes
2. Show me what will be created, updated, and destroyed
3. Ask for my confirmation before proceeding
4. If I confirm, apply the changes
5. Monitor the command until completion and report results";

const PATCH_INFRASTRUCTURE: &str = "I need to make an urgent targeted change to my infrastructure.

Help me:
1. Identify the resource(s) to modify
2. Create a minimal forma file with only the targeted change
3. Simulate the patch to verify it does what I want
4. Apply the patch with my confirmation
5. Monitor until complete

IMPORTANT: After the patch is applied, remind me that this change will appear as drift until I reconcile my IaC code. Suggest running the drift check workflow when the incident is resolved.";

const BUILD_PLUGIN_STEPS: &str = "Follow the plugin SDK tutorial at https://docs.formae.io/en/latest/plugin-sdk/tutorial/ from start to finish.

Steps:
1. Research the provider's API to understand resources and their properties
2. Scaffold the plugin using formae plugin init --no-input
3. Follow the tutorial's TDD workflow
4. Run conformance tests (make conformance-test) to verify
5. Create a working example
6. Update the README

Reference existing plugins (aws, azure, gcp, oci, ovh) as prior art.

CRITICAL: After ANY code changes, run 'make install' before running conformance tests. The tests run against the installed plugin binary, not source code.";

const ADD_RESOURCE_TYPE_STEPS: &str = "Steps:
1. Research the provider API for this resource type
2. Define the PKL schema for the resource
3. Implement the CRUD operations in the plugin
4. Add unit tests following TDD
5. Run conformance tests to verify
6. Add an example and update documentation

Follow the existing patterns in the plugin for consistency. Always run 'make install' before running tests.";

pub fn list_prompts() -> Vec<PromptDefinition> {
    PROMPTS
        .iter()
        .map(|(name, description, arguments)| PromptDefinition {
            name: name.to_string(),
            description: description.to_string(),
            arguments: arguments
                .iter()
                .map(|(name, description, required)| PromptArgument {
                    name: name.to_string(),
                    description: description.to_string(),
                    required: *required,
                })
                .collect(),
        })
        .collect()
}

/// Non-empty string argument, if supplied
fn argument<'a>(arguments: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
}

fn required<'a>(arguments: &'a Map<String, Value>, prompt: &str, name: &str) -> Result<&'a str> {
    argument(arguments, name).ok_or_else(|| {
        FormaeError::InvalidInput(format!(
            "missing required argument '{}' for prompt {}",
            name, prompt
        ))
    })
}

/// Render prompt `name` with the supplied arguments
pub fn get_prompt(name: &str, arguments: &Map<String, Value>) -> Result<GetPromptResult> {
    let result = match name {
        "check_drift" => GetPromptResult::user("Check for infrastructure drift", CHECK_DRIFT),
        "discover_resources" => {
            GetPromptResult::user("Discover unmanaged resources", DISCOVER_RESOURCES)
        }
        "import_resources" => {
            let query = match argument(arguments, "query") {
                Some(q) => format!("managed:false {}", q),
                None => "managed:false".to_string(),
            };
            GetPromptResult::user(
                "Import unmanaged resources",
                format!(
                    "I want to bring unmanaged resources under formae management. Query the resources with: {}\n\n{}",
                    query, IMPORT_RESOURCES_STEPS
                ),
            )
        }
        "deploy_infrastructure" => {
            let file_path = required(arguments, name, "file_path")?;
            GetPromptResult::user(
                "Deploy infrastructure",
                format!(
                    "I want to deploy infrastructure using the forma file at: {}\n\n{}",
                    file_path, DEPLOY_STEPS
                ),
            )
        }
        "patch_infrastructure" => GetPromptResult::user("Patch infrastructure", PATCH_INFRASTRUCTURE),
        "build_plugin" => {
            let provider = required(arguments, name, "provider")?;
            GetPromptResult::user(
                format!("Build a new formae plugin for {}", provider),
                format!(
                    "I want to build a new formae resource plugin for {}.\n\n{}",
                    provider, BUILD_PLUGIN_STEPS
                ),
            )
        }
        "add_resource_type" => {
            let resource_type = required(arguments, name, "resource_type")?;
            GetPromptResult::user(
                format!("Add resource type: {}", resource_type),
                format!(
                    "I want to add support for the {} resource type to my existing formae plugin.\n\n{}",
                    resource_type, ADD_RESOURCE_TYPE_STEPS
                ),
            )
        }
        _ => {
            return Err(FormaeError::InvalidInput(format!(
                "unknown prompt: {}",
                name
            )))
        }
    };

    Ok(result)
}
