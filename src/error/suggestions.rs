//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints that
//! name the offending path or rule.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context carries nothing
/// more specific.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::PathNotFound => suggest_path_not_found(context),
        ErrorCode::DestinationCollision => suggest_destination_collision(context),
        ErrorCode::InvalidRule => suggest_invalid_rule(context),
        ErrorCode::PartialApply => suggest_partial_apply(context),
        ErrorCode::UnclassifiedFile => suggest_unclassified(context),
        _ => code.suggestion().to_string(),
    }
}

fn context_str<'a>(context: Option<&'a Value>, key: &str) -> Option<&'a str> {
    context.and_then(|c| c.get(key)).and_then(Value::as_str)
}

fn suggest_path_not_found(context: Option<&Value>) -> String {
    match context_str(context, "path") {
        Some(path) => format!(
            "'{path}' does not exist. Pass the project root with `-C <dir>`; the tests directory is resolved below it (`--tests-dir`, default `tests`)"
        ),
        None => ErrorCode::PathNotFound.suggestion().to_string(),
    }
}

fn suggest_destination_collision(context: Option<&Value>) -> String {
    let destination = context_str(context, "destination");
    let sources = context
        .and_then(|c| c.get("sources"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty());

    match (destination, sources) {
        (Some(dest), Some(sources)) => format!(
            "'{dest}' would receive {sources}. Rename one of them or add a more specific rule ahead of the one that matched"
        ),
        (Some(dest), None) => format!(
            "'{dest}' already exists. Move or remove it first; tmig never overwrites files"
        ),
        _ => ErrorCode::DestinationCollision.suggestion().to_string(),
    }
}

fn suggest_invalid_rule(context: Option<&Value>) -> String {
    match (context_str(context, "rule"), context_str(context, "reason")) {
        (Some(rule), Some(reason)) => format!(
            "Rule '{rule}' is invalid: {reason}\nKnown placeholders: {{tests_dir}} {{service}} {{feature}} {{sprint}} {{parent}} {{file}} {{stem}} {{rest}} {{path}}"
        ),
        _ => ErrorCode::InvalidRule.suggestion().to_string(),
    }
}

fn suggest_partial_apply(context: Option<&Value>) -> String {
    let failed = context.and_then(|c| c.get("failed")).and_then(Value::as_u64);
    match failed {
        Some(1) => "One move failed. Fix its cause and re-run `tmig apply`; moved files are now in place and are skipped".to_string(),
        Some(n) => format!(
            "{n} moves failed. Fix their causes and re-run `tmig apply`; moved files are now in place and are skipped"
        ),
        None => ErrorCode::PartialApply.suggestion().to_string(),
    }
}

fn suggest_unclassified(context: Option<&Value>) -> String {
    match context_str(context, "path") {
        Some(path) => format!(
            "No rule matches '{path}'. Check it with `tmig rules --explain {path}` and add a rule, or move it by hand"
        ),
        None => ErrorCode::UnclassifiedFile.suggestion().to_string(),
    }
}
