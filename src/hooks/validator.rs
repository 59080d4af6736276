//! Advisory hook set validation
//!
//! The store only checks YAML syntax before saving, so a document can be
//! syntactically fine yet describe hooks the dispatcher will refuse or
//! misread. This linter reports such problems as [`Finding`]s without ever
//! blocking a load or a save on its own.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use super::rules::{MatchRule, MatchType, TriggerRule};
use super::types::{Hook, HookSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One problem found in a hook set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Position of the hook in the set
    pub hook_index: usize,
    pub hook_id: String,
    /// Dotted path to the offending field, e.g. `trigger-rule.and[1].match`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hook = if self.hook_id.is_empty() {
            format!("#{}", self.hook_index)
        } else {
            format!("'{}'", self.hook_id)
        };
        write!(f, "{}: hook {} {}: {}", self.severity, hook, self.path, self.message)
    }
}

/// Trait for hook set validators
pub trait HookSetValidator: Send + Sync {
    /// Inspect every hook and return all findings in document order
    fn inspect(&self, hooks: &HookSet) -> Vec<Finding>;

    /// True when any finding is an error
    fn has_errors(&self, hooks: &HookSet) -> bool {
        self.inspect(hooks)
            .iter()
            .any(|finding| finding.severity == Severity::Error)
    }
}

/// Default implementation of HookSetValidator
pub struct DefaultHookSetValidator {
    /// Nesting depth past which a rule tree is reported
    max_rule_depth: usize,
}

impl DefaultHookSetValidator {
    pub fn new() -> Self {
        Self { max_rule_depth: 32 }
    }

    pub fn with_max_rule_depth(max_rule_depth: usize) -> Self {
        Self { max_rule_depth }
    }

    fn inspect_hook(&self, index: usize, hook: &Hook, out: &mut Vec<Finding>) {
        let mut report = |severity: Severity, path: &str, message: String| {
            out.push(Finding {
                severity,
                hook_index: index,
                hook_id: hook.id.clone(),
                path: path.to_string(),
                message,
            });
        };

        if hook.id.trim().is_empty() {
            report(Severity::Error, "id", "hook id must not be empty".to_string());
        }
        if hook.execute_command.trim().is_empty() {
            report(
                Severity::Warning,
                "execute-command",
                "no command configured; the hook will fail when triggered".to_string(),
            );
        }

        for (list_name, arguments) in hook.argument_lists() {
            for (position, argument) in arguments.iter().enumerate() {
                if let Some(source) = argument.source.as_ref().filter(|s| !s.is_known()) {
                    report(
                        Severity::Warning,
                        &format!("{list_name}[{position}].source"),
                        format!("unrecognized argument source '{}'", source),
                    );
                }
            }
        }

        if let Some(rule) = &hook.trigger_rule {
            rule.walk("trigger-rule", &mut |path, node| {
                let depth = path.matches('.').count();
                if depth == self.max_rule_depth {
                    report(
                        Severity::Warning,
                        path,
                        format!("trigger rule nesting exceeds {} levels", self.max_rule_depth),
                    );
                }
                match node {
                    TriggerRule::Mixed(branches) => {
                        report(
                            Severity::Error,
                            path,
                            format!(
                                "rule node populates {} branches; exactly one of and/or/not/match is allowed",
                                branches.populated()
                            ),
                        );
                        if let Some(rule) = &branches.match_rule {
                            for (severity, message) in inspect_match(rule) {
                                report(severity, &format!("{path}.match"), message);
                            }
                        }
                    }
                    TriggerRule::And(rules) | TriggerRule::Or(rules) if rules.is_empty() => report(
                        Severity::Warning,
                        path,
                        format!("empty '{}' list", node.kind().unwrap_or_default()),
                    ),
                    TriggerRule::Not(inner) if matches!(inner.as_ref(), TriggerRule::Empty) => report(
                        Severity::Error,
                        path,
                        "'not' wraps an empty rule".to_string(),
                    ),
                    TriggerRule::Match(rule) => {
                        for (severity, message) in inspect_match(rule) {
                            report(severity, &format!("{path}.match"), message);
                        }
                    }
                    _ => {}
                }
            });
        }
    }
}

impl Default for DefaultHookSetValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl HookSetValidator for DefaultHookSetValidator {
    fn inspect(&self, hooks: &HookSet) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();

        for (index, hook) in hooks.iter().enumerate() {
            self.inspect_hook(index, hook, &mut findings);

            if hook.id.is_empty() {
                continue;
            }
            if let Some(first) = first_seen.get(hook.id.as_str()) {
                findings.push(Finding {
                    severity: Severity::Error,
                    hook_index: index,
                    hook_id: hook.id.clone(),
                    path: "id".to_string(),
                    message: format!("duplicate id, first defined by hook #{}", first),
                });
            } else {
                first_seen.insert(hook.id.as_str(), index);
            }
        }

        findings
    }
}

fn inspect_match(rule: &MatchRule) -> Vec<(Severity, String)> {
    let mut problems = Vec::new();

    let Some(match_type) = &rule.match_type else {
        problems.push((Severity::Warning, "match has no type".to_string()));
        return problems;
    };

    match match_type {
        MatchType::Value if rule.value.is_empty() => {
            problems.push((Severity::Warning, "'value' match without a value".to_string()));
        }
        MatchType::Regex if rule.regex.is_empty() => {
            problems.push((Severity::Warning, "'regex' match without a regex".to_string()));
        }
        MatchType::Regex => {
            if let Err(e) = Regex::new(&rule.regex) {
                problems.push((Severity::Error, format!("invalid regex: {}", e)));
            }
        }
        MatchType::IpWhitelist if rule.ip_range.is_empty() => {
            problems.push((Severity::Warning, "'ip-whitelist' match without an ip-range".to_string()));
        }
        MatchType::IpWhitelist => {
            for range in rule.ip_range.split_whitespace() {
                if let Err(reason) = check_cidr(range) {
                    problems.push((Severity::Error, format!("invalid ip-range '{}': {}", range, reason)));
                }
            }
        }
        MatchType::Other(raw) => {
            problems.push((Severity::Warning, format!("unrecognized match type '{}'", raw)));
        }
        known if known.needs_secret() && rule.secret.is_empty() => {
            problems.push((Severity::Warning, format!("'{}' match without a secret", known)));
        }
        _ => {}
    }

    problems
}

/// Accepts a bare address or `address/prefix`
fn check_cidr(range: &str) -> Result<(), String> {
    let (address, prefix) = match range.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (range, None),
    };
    let address: IpAddr = address
        .parse()
        .map_err(|_| format!("'{}' is not an IP address", address))?;

    if let Some(prefix) = prefix {
        let bits: u8 = prefix
            .parse()
            .map_err(|_| format!("'{}' is not a prefix length", prefix))?;
        let max = if address.is_ipv4() { 32 } else { 128 };
        if bits > max {
            return Err(format!("prefix length {} exceeds {}", bits, max));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::parse;

    fn findings(raw: &str) -> Vec<Finding> {
        DefaultHookSetValidator::new().inspect(&parse(raw).unwrap())
    }

    #[test]
    fn test_clean_hook_has_no_findings() {
        let raw = r#"
- id: deploy
  execute-command: /srv/deploy.sh
  trigger-rule:
    match: {type: value, value: main, parameter: {source: payload, name: ref}}
"#;
        assert!(findings(raw).is_empty());
    }

    #[test]
    fn test_duplicate_and_empty_ids() {
        let raw = "- id: a\n  execute-command: x\n- id: a\n  execute-command: y\n- execute-command: z\n";
        let found = findings(raw);

        assert!(found
            .iter()
            .any(|f| f.hook_index == 1 && f.message.contains("duplicate id")));
        assert!(found
            .iter()
            .any(|f| f.hook_index == 2 && f.message.contains("must not be empty")));
        assert!(DefaultHookSetValidator::new().has_errors(&parse(raw).unwrap()));
    }

    #[test]
    fn test_mixed_node_is_error_with_path() {
        let raw = r#"
- id: odd
  execute-command: x
  trigger-rule:
    not:
      and: []
      or: []
"#;
        let found = findings(raw);
        let mixed = found
            .iter()
            .find(|f| f.message.contains("branches"))
            .expect("mixed node finding");
        assert_eq!(mixed.severity, Severity::Error);
        assert_eq!(mixed.path, "trigger-rule.not");
    }

    #[test]
    fn test_match_branch_of_mixed_node_is_checked() {
        let raw = r#"
- id: odd
  execute-command: x
  trigger-rule:
    or:
      - match: {type: value, value: a}
    match: {type: regex, regex: "([unclosed"}
"#;
        let found = findings(raw);

        let regex = found
            .iter()
            .find(|f| f.message.contains("invalid regex"))
            .expect("regex finding on the mixed node");
        assert_eq!(regex.severity, Severity::Error);
        assert_eq!(regex.path, "trigger-rule.match");
        assert!(found
            .iter()
            .any(|f| f.path == "trigger-rule" && f.message.contains("branches")));
    }

    #[test]
    fn test_match_operand_checks() {
        let raw = r#"
- id: checks
  execute-command: x
  trigger-rule:
    or:
      - match: {type: regex, regex: "([unclosed"}
      - match: {type: payload-hmac-sha1}
      - match: {type: ip-whitelist, ip-range: "10.0.0.0/33 192.168.1.0/24"}
      - match: {type: sparkle}
"#;
        let found = findings(raw);
        let messages: Vec<_> = found.iter().map(|f| f.to_string()).collect();

        assert!(messages.iter().any(|m| m.contains("or[0].match") && m.contains("invalid regex")));
        assert!(messages.iter().any(|m| m.contains("or[1].match") && m.contains("without a secret")));
        assert!(messages.iter().any(|m| m.contains("10.0.0.0/33")));
        assert!(!messages.iter().any(|m| m.contains("192.168.1.0/24")));
        assert!(messages.iter().any(|m| m.contains("unrecognized match type 'sparkle'")));
    }

    #[test]
    fn test_unknown_argument_source_warns() {
        let raw = r#"
- id: args
  execute-command: x
  pass-arguments-to-command:
    - source: entire-payload
"#;
        let found = findings(raw);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(found[0].path, "pass-arguments-to-command[0].source");
    }

    #[test]
    fn test_deep_rule_tree_warns() {
        let raw = r#"
- id: deep
  execute-command: x
  trigger-rule:
    not:
      not:
        match: {type: value, value: v}
"#;
        let found = DefaultHookSetValidator::with_max_rule_depth(2).inspect(&parse(raw).unwrap());
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("nesting exceeds 2 levels"));
    }

    #[test]
    fn test_check_cidr() {
        assert!(check_cidr("127.0.0.1").is_ok());
        assert!(check_cidr("::1/128").is_ok());
        assert!(check_cidr("fe80::/129").is_err());
        assert!(check_cidr("not-an-ip/8").is_err());
    }
}
