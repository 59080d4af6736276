//! YAML encoding of hook sets
//!
//! `parse` performs syntactic deserialization only: unknown keys are ignored
//! and odd-but-representable constructs (multi-branch rule nodes, unknown
//! match types) are kept. Semantic checks live in [`super::validator`].
//!
//! The dispatcher reads the file with a YAML 1.1 parser, so `parse` applies
//! `<<` merge keys and reads only the first document of a stream, and
//! `serialize` quotes strings a YAML 1.1 reader would take for booleans.

use serde::Deserialize;
use serde_yaml::Value;

use crate::errors::{AppError, AppResult};

use super::types::{yaml11_bool, HookSet};

/// Parse a hook document into an ordered [`HookSet`]
///
/// A blank or comment-only document, a bare `null` and `[]` all yield an
/// empty set. Documents after the first one are ignored.
pub fn parse(raw: &str) -> AppResult<HookSet> {
    if is_blank_document(raw) {
        return Ok(HookSet::default());
    }
    let Some(document) = serde_yaml::Deserializer::from_str(raw).next() else {
        return Ok(HookSet::default());
    };

    let mut value = Value::deserialize(document).map_err(AppError::parse)?;
    value.apply_merge().map_err(AppError::parse)?;

    let hooks: Option<HookSet> = serde_yaml::from_value(value).map_err(AppError::parse)?;
    Ok(hooks.unwrap_or_default())
}

/// True when `raw` holds nothing but whitespace and comments
///
/// libyaml reports such a stream as having no document at all, which
/// serde_yaml turns into an end-of-stream error.
pub(crate) fn is_blank_document(raw: &str) -> bool {
    raw.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Serialize a [`HookSet`] back to YAML
///
/// Default-valued fields are omitted; `parse(serialize(h)) == h` holds for
/// every set `parse` can produce.
pub fn serialize(hooks: &HookSet) -> AppResult<String> {
    let yaml = serde_yaml::to_string(hooks).map_err(|e| AppError::Serialize {
        message: e.to_string(),
        source: Some(Box::new(e)),
    })?;
    Ok(quote_yaml11_booleans(&yaml))
}

/// Single-quote plain scalars such as `yes` or `off` in emitted block YAML
///
/// serde_yaml follows YAML 1.2 and leaves them bare. Block scalar bodies
/// (`|` / `>`) are copied untouched.
fn quote_yaml11_booleans(yaml: &str) -> String {
    let mut out = String::with_capacity(yaml.len());
    // Column of the key owning the block scalar currently being copied
    let mut block_owner: Option<usize> = None;

    for line in yaml.lines() {
        let indent = line.len() - line.trim_start().len();
        if let Some(owner) = block_owner {
            if line.trim().is_empty() || indent > owner {
                out.push_str(line);
                out.push('\n');
                continue;
            }
            block_owner = None;
        }

        // Skip the indentation and any `- ` sequence markers
        let mut start = indent;
        while line[start..].starts_with("- ") {
            start += 2;
        }
        let rest = &line[start..];
        let value_start = match rest.find(": ") {
            Some(pos) => start + pos + 2,
            None if rest.ends_with(':') => line.len(),
            None => start,
        };
        let value = &line[value_start..];

        if value.starts_with('|') || value.starts_with('>') {
            // A keyed block belongs to its key; a bare one to its `- ` marker
            let owner = if value_start > start { start } else { start.saturating_sub(2) };
            block_owner = Some(owner);
        }
        if yaml11_bool(value).is_some() {
            out.push_str(&line[..value_start]);
            out.push('\'');
            out.push_str(value);
            out.push('\'');
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
