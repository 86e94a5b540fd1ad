use std::collections::BTreeMap;

use crate::{ComplianceError, Result};

/// Substitutes `{name}` placeholders in `template`.
///
/// Each value is percent-encoded on its own, so a `/` inside a value becomes
/// `%2F` instead of an extra path segment. Missing or empty values are
/// rejected so a path like `/profiles//attachments` is never produced.
pub fn resolve_path(template: &str, params: &BTreeMap<String, String>) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        resolved.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ComplianceError::Validation(format!(
                "unterminated placeholder in path template '{template}'"
            ))
        })?;

        let name = &after[..close];
        let value = params.get(name).map(String::as_str).unwrap_or_default();
        if value.is_empty() {
            return Err(ComplianceError::Validation(format!(
                "path parameter '{name}' must be provided and non-empty"
            )));
        }

        resolved.push_str(&urlencoding::encode(value));
        rest = &after[close + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}
