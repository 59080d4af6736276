//! Hook record schema
//!
//! These structures mirror the dispatcher's hook file one-to-one. Field names
//! on the wire are kebab-case; every field except `id` is optional and falls
//! back to its default (empty string, empty list, `false`, absent) when
//! missing. Fields holding their default are left out when serializing so a
//! saved file stays as terse as the operator wrote it.

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::TriggerRule;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Boolean spellings of YAML 1.1, which the dispatcher's own parser accepts
pub(crate) fn yaml11_bool(word: &str) -> Option<bool> {
    match word {
        "y" | "Y" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" | "true" | "True" | "TRUE" => {
            Some(true)
        }
        "n" | "N" | "no" | "No" | "NO" | "off" | "Off" | "OFF" | "false" | "False" | "FALSE" => {
            Some(false)
        }
        _ => None,
    }
}

/// Accepts `true`/`false` plus the YAML 1.1 words `yes`/`no`/`on`/`off`;
/// an explicit null reads as `false`
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientBool;

    impl<'de> Visitor<'de> for LenientBool {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean such as true, false, yes, no, on or off")
        }

        fn visit_bool<E>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            yaml11_bool(value).ok_or_else(|| E::invalid_value(Unexpected::Str(value), &self))
        }

        fn visit_unit<E>(self) -> Result<bool, E> {
            Ok(false)
        }
    }

    deserializer.deserialize_any(LenientBool)
}

/// An ordered list of hooks, the top-level value of the hook file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookSet {
    hooks: Vec<Hook>,
}

impl HookSet {
    pub fn new(hooks: Vec<Hook>) -> Self {
        Self { hooks }
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hook> {
        self.hooks.iter()
    }

    /// First hook with the given id
    pub fn find(&self, id: &str) -> Option<&Hook> {
        self.hooks.iter().find(|hook| hook.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|hook| hook.id.as_str())
    }

    pub fn into_inner(self) -> Vec<Hook> {
        self.hooks
    }
}

impl From<Vec<Hook>> for HookSet {
    fn from(hooks: Vec<Hook>) -> Self {
        Self::new(hooks)
    }
}

impl<'a> IntoIterator for &'a HookSet {
    type Item = &'a Hook;
    type IntoIter = std::slice::Iter<'a, Hook>;

    fn into_iter(self) -> Self::IntoIter {
        self.hooks.iter()
    }
}

/// One configured hook binding a trigger rule to a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Hook {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub execute_command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_working_directory: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response_message: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_headers: Vec<ResponseHeader>,

    #[serde(
        default,
        rename = "include-command-output-in-response",
        deserialize_with = "lenient_bool",
        skip_serializing_if = "is_false"
    )]
    pub capture_command_output: bool,

    #[serde(
        default,
        rename = "include-command-output-in-response-on-error",
        deserialize_with = "lenient_bool",
        skip_serializing_if = "is_false"
    )]
    pub capture_command_output_on_error: bool,

    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "is_false")]
    pub stream_command_output: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pass_environment_to_command: Vec<Argument>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pass_arguments_to_command: Vec<Argument>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pass_file_to_command: Vec<Argument>,

    #[serde(
        default,
        rename = "parse-parameters-as-json",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub json_string_parameters: Vec<Argument>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_rule: Option<TriggerRule>,

    #[serde(
        default,
        rename = "trigger-rule-mismatch-http-response-code",
        skip_serializing_if = "Option::is_none"
    )]
    pub mismatch_response_code: Option<u16>,

    #[serde(
        default,
        rename = "success-http-response-code",
        skip_serializing_if = "Option::is_none"
    )]
    pub success_response_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_payload_content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_methods: Vec<String>,

    #[serde(
        default,
        rename = "trigger-signature-soft-failures",
        deserialize_with = "lenient_bool",
        skip_serializing_if = "is_false"
    )]
    pub signature_soft_failures: bool,
}

impl Hook {
    pub fn new(id: impl Into<String>, execute_command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            execute_command: execute_command.into(),
            ..Self::default()
        }
    }

    /// True when no trigger rule restricts this hook
    ///
    /// Both a missing `trigger-rule` and the empty node `{}` mean the hook
    /// fires on every request.
    pub fn fires_unconditionally(&self) -> bool {
        matches!(self.trigger_rule, None | Some(TriggerRule::Empty))
    }

    /// The four argument projections paired with their wire names
    pub fn argument_lists(&self) -> [(&'static str, &[Argument]); 4] {
        [
            ("pass-environment-to-command", &self.pass_environment_to_command),
            ("pass-arguments-to-command", &self.pass_arguments_to_command),
            ("pass-file-to-command", &self.pass_file_to_command),
            ("parse-parameters-as-json", &self.json_string_parameters),
        ]
    }
}

/// A `name: value` pair added to the dispatcher's HTTP response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A reference to a piece of request data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArgumentSource>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envname: Option<String>,

    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "is_false")]
    pub base64decode: bool,
}

impl Argument {
    pub fn new(source: ArgumentSource, name: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            name: name.into(),
            ..Self::default()
        }
    }

    /// True when every field holds its default
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Where an [`Argument`] is looked up
///
/// Unrecognized sources are kept verbatim so a file written for a newer
/// dispatcher survives a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ArgumentSource {
    Header,
    Query,
    Payload,
    String,
    Url,
    Request,
    RawRequest,
    Other(std::string::String),
}

impl ArgumentSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Header => "header",
            Self::Query => "query",
            Self::Payload => "payload",
            Self::String => "string",
            Self::Url => "url",
            Self::Request => "request",
            Self::RawRequest => "raw-request",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<std::string::String> for ArgumentSource {
    fn from(raw: std::string::String) -> Self {
        match raw.as_str() {
            "header" => Self::Header,
            "query" => Self::Query,
            "payload" => Self::Payload,
            "string" => Self::String,
            "url" => Self::Url,
            "request" => Self::Request,
            "raw-request" => Self::RawRequest,
            _ => Self::Other(raw),
        }
    }
}

impl From<ArgumentSource> for std::string::String {
    fn from(source: ArgumentSource) -> Self {
        match source {
            ArgumentSource::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ArgumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_source_preserves_unknown() {
        let source = ArgumentSource::from("context".to_string());
        assert_eq!(source, ArgumentSource::Other("context".to_string()));
        assert!(!source.is_known());
        assert_eq!(std::string::String::from(source), "context");
    }

    #[test]
    fn test_argument_source_known_names() {
        for name in ["header", "query", "payload", "string", "url", "request", "raw-request"] {
            let source = ArgumentSource::from(name.to_string());
            assert!(source.is_known(), "{} should be known", name);
            assert_eq!(source.as_str(), name);
        }
    }

    #[test]
    fn test_hook_without_rule_fires_unconditionally() {
        let mut hook = Hook::new("deploy", "/srv/scripts/deploy.sh");
        assert!(hook.fires_unconditionally());

        hook.trigger_rule = Some(TriggerRule::Empty);
        assert!(hook.fires_unconditionally());

        hook.trigger_rule = Some(TriggerRule::And(vec![]));
        assert!(!hook.fires_unconditionally());
    }

    #[test]
    fn test_hook_set_lookup() {
        let set = HookSet::new(vec![Hook::new("build", "b.sh"), Hook::new("deploy", "d.sh")]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.find("deploy").map(|h| h.execute_command.as_str()), Some("d.sh"));
        assert!(set.find("missing").is_none());
        assert_eq!(set.ids().collect::<Vec<_>>(), vec!["build", "deploy"]);
    }
}
