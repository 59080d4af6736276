//! Trigger rule tree
//!
//! On the wire a rule node is a mapping with up to four keys (`and`, `or`,
//! `not`, `match`) of which exactly one should be present. In memory a node
//! is a [`TriggerRule`] variant, so a well-formed tree cannot hold two
//! branches at once. Nodes that do carry several branches are still accepted
//! and kept verbatim as [`TriggerRule::Mixed`]; deciding what such a node
//! means is the dispatcher's business, not the loader's.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Argument;

/// A boolean expression deciding whether a hook fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleBranches", into = "RuleBranches")]
pub enum TriggerRule {
    /// The empty node `{}`: no restriction
    Empty,
    And(Vec<TriggerRule>),
    Or(Vec<TriggerRule>),
    Not(Box<TriggerRule>),
    Match(MatchRule),
    /// A node with more than one branch populated, preserved as written
    Mixed(Box<RuleBranches>),
}

/// Wire form of a rule node: one optional slot per branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBranches {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<TriggerRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<TriggerRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<TriggerRule>>,

    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_rule: Option<MatchRule>,
}

impl RuleBranches {
    pub fn populated(&self) -> usize {
        [
            self.and.is_some(),
            self.or.is_some(),
            self.not.is_some(),
            self.match_rule.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

impl From<RuleBranches> for TriggerRule {
    fn from(branches: RuleBranches) -> Self {
        if branches.populated() > 1 {
            return TriggerRule::Mixed(Box::new(branches));
        }
        match branches {
            RuleBranches { and: Some(rules), .. } => TriggerRule::And(rules),
            RuleBranches { or: Some(rules), .. } => TriggerRule::Or(rules),
            RuleBranches { not: Some(rule), .. } => TriggerRule::Not(rule),
            RuleBranches { match_rule: Some(rule), .. } => TriggerRule::Match(rule),
            _ => TriggerRule::Empty,
        }
    }
}

impl From<TriggerRule> for RuleBranches {
    fn from(rule: TriggerRule) -> Self {
        match rule {
            TriggerRule::Empty => RuleBranches::default(),
            TriggerRule::And(rules) => RuleBranches {
                and: Some(rules),
                ..RuleBranches::default()
            },
            TriggerRule::Or(rules) => RuleBranches {
                or: Some(rules),
                ..RuleBranches::default()
            },
            TriggerRule::Not(rule) => RuleBranches {
                not: Some(rule),
                ..RuleBranches::default()
            },
            TriggerRule::Match(rule) => RuleBranches {
                match_rule: Some(rule),
                ..RuleBranches::default()
            },
            TriggerRule::Mixed(branches) => *branches,
        }
    }
}

impl TriggerRule {
    /// Wire name of the populated branch, or `None` for empty and mixed nodes
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            TriggerRule::And(_) => Some("and"),
            TriggerRule::Or(_) => Some("or"),
            TriggerRule::Not(_) => Some("not"),
            TriggerRule::Match(_) => Some("match"),
            TriggerRule::Empty | TriggerRule::Mixed(_) => None,
        }
    }

    /// Direct sub-rules of this node in document order
    pub fn children(&self) -> Vec<&TriggerRule> {
        match self {
            TriggerRule::And(rules) | TriggerRule::Or(rules) => rules.iter().collect(),
            TriggerRule::Not(rule) => vec![rule.as_ref()],
            TriggerRule::Mixed(branches) => {
                let mut children: Vec<&TriggerRule> = Vec::new();
                children.extend(branches.and.iter().flatten());
                children.extend(branches.or.iter().flatten());
                children.extend(branches.not.as_deref());
                children
            }
            TriggerRule::Empty | TriggerRule::Match(_) => Vec::new(),
        }
    }

    /// Depth-first walk over every node, calling `visit` with a dotted path
    pub fn walk<'a, F>(&'a self, path: &str, visit: &mut F)
    where
        F: FnMut(&str, &'a TriggerRule),
    {
        visit(path, self);
        match self {
            TriggerRule::And(rules) => walk_list(rules, &format!("{path}.and"), visit),
            TriggerRule::Or(rules) => walk_list(rules, &format!("{path}.or"), visit),
            TriggerRule::Not(rule) => rule.walk(&format!("{path}.not"), visit),
            TriggerRule::Mixed(branches) => {
                if let Some(rules) = &branches.and {
                    walk_list(rules, &format!("{path}.and"), visit);
                }
                if let Some(rules) = &branches.or {
                    walk_list(rules, &format!("{path}.or"), visit);
                }
                if let Some(rule) = &branches.not {
                    rule.walk(&format!("{path}.not"), visit);
                }
            }
            TriggerRule::Empty | TriggerRule::Match(_) => {}
        }
    }
}

fn walk_list<'a, F>(rules: &'a [TriggerRule], path: &str, visit: &mut F)
where
    F: FnMut(&str, &'a TriggerRule),
{
    for (index, rule) in rules.iter().enumerate() {
        rule.walk(&format!("{path}[{index}]"), visit);
    }
}

/// Leaf predicate of a trigger rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatchRule {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regex: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(default, skip_serializing_if = "Argument::is_empty")]
    pub parameter: Argument,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip_range: String,
}

/// Kind of comparison a [`MatchRule`] performs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchType {
    Value,
    Regex,
    PayloadHmacSha1,
    PayloadHmacSha256,
    PayloadHmacSha512,
    PayloadHashSha1,
    PayloadHashSha256,
    PayloadHashSha512,
    IpWhitelist,
    ScalrSignature,
    Other(String),
}

impl MatchType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Value => "value",
            Self::Regex => "regex",
            Self::PayloadHmacSha1 => "payload-hmac-sha1",
            Self::PayloadHmacSha256 => "payload-hmac-sha256",
            Self::PayloadHmacSha512 => "payload-hmac-sha512",
            Self::PayloadHashSha1 => "payload-hash-sha1",
            Self::PayloadHashSha256 => "payload-hash-sha256",
            Self::PayloadHashSha512 => "payload-hash-sha512",
            Self::IpWhitelist => "ip-whitelist",
            Self::ScalrSignature => "scalr-signature",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Signature checks that need a shared `secret`
    pub fn needs_secret(&self) -> bool {
        matches!(
            self,
            Self::PayloadHmacSha1
                | Self::PayloadHmacSha256
                | Self::PayloadHmacSha512
                | Self::PayloadHashSha1
                | Self::PayloadHashSha256
                | Self::PayloadHashSha512
                | Self::ScalrSignature
        )
    }
}

impl From<String> for MatchType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "value" => Self::Value,
            "regex" => Self::Regex,
            "payload-hmac-sha1" => Self::PayloadHmacSha1,
            "payload-hmac-sha256" => Self::PayloadHmacSha256,
            "payload-hmac-sha512" => Self::PayloadHmacSha512,
            "payload-hash-sha1" => Self::PayloadHashSha1,
            "payload-hash-sha256" => Self::PayloadHashSha256,
            "payload-hash-sha512" => Self::PayloadHashSha512,
            "ip-whitelist" => Self::IpWhitelist,
            "scalr-signature" => Self::ScalrSignature,
            _ => Self::Other(raw),
        }
    }
}

impl From<MatchType> for String {
    fn from(match_type: MatchType) -> Self {
        match match_type {
            MatchType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
