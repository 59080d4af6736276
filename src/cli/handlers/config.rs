//! Hook configuration handler
//!
//! Implements the commands that read, check and replace the hook file:
//! `show`, `raw`, `check`, `save` and `format`.

use super::super::args::DocumentInput;
use super::super::CliContext;
use crate::hooks::{
    self, Argument, Finding, Hook, HookSetValidator, MatchRule, MatchType, Severity, TriggerRule,
};
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use tracing::{debug, warn};

/// Handler for hook configuration operations
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    /// Create new configuration handler
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    /// Print a summary of every hook, or the whole set as JSON
    pub fn handle_show(&self, json: bool) -> Result<()> {
        let store = self.context.config_store();
        let hooks = store.load()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&hooks)?);
            return Ok(());
        }

        if hooks.is_empty() {
            println!("No hooks configured in {}", store.path().display());
            return Ok(());
        }

        let noun = if hooks.len() == 1 { "hook" } else { "hooks" };
        println!("{} {} in {}", hooks.len(), noun, store.path().display());
        for hook in &hooks {
            println!();
            print!("{}", render_hook(hook));
        }
        Ok(())
    }

    /// Print the stored document unchanged, ready for editing
    pub fn handle_raw(&self) -> Result<()> {
        let raw = self.context.config_store().read_raw()?;
        print!("{}", raw);
        Ok(())
    }

    /// Check syntax, then lint whatever parses as hooks
    ///
    /// Fails on syntax errors, schema mismatches and lint errors; warnings
    /// alone still succeed.
    pub fn handle_check(&self, input: DocumentInput) -> Result<()> {
        let source = input.describe();
        let raw = input.read()?;

        self.context
            .config_store()
            .validate(&raw)
            .with_context(|| format!("{} is not valid YAML", source))?;

        let hook_set = hooks::parse(&raw)
            .with_context(|| format!("{} is valid YAML but not a hook list", source))?;
        let findings = hooks::create_default_validator().inspect(&hook_set);

        for finding in &findings {
            println!("{}", finding);
        }
        let errors = count_errors(&findings);
        if errors > 0 {
            bail!("{} has {} error(s)", source, errors);
        }

        println!(
            "{}: {} hook(s), {} warning(s)",
            source,
            hook_set.len(),
            findings.len()
        );
        Ok(())
    }

    /// Commit a new document to the hook file
    ///
    /// Without `strict` the linter only reports; the save itself follows the
    /// store's syntax-only rules.
    pub fn handle_save(&self, input: DocumentInput, strict: bool) -> Result<()> {
        let source = input.describe();
        let raw = input.read()?;
        let store = self.context.config_store();

        if strict {
            let hook_set = hooks::parse(&raw)
                .with_context(|| format!("Refusing to save {}: not a hook list", source))?;
            let findings = hooks::create_default_validator().inspect(&hook_set);
            for finding in &findings {
                eprintln!("{}", finding);
            }
            let errors = count_errors(&findings);
            if errors > 0 {
                bail!("Refusing to save {}: {} lint error(s)", source, errors);
            }
        }

        store.commit(&raw)?;

        if !strict {
            self.report_advisories(&raw);
        }
        println!("Saved {} bytes from {} to {}", raw.len(), source, store.path().display());
        Ok(())
    }

    /// Print the current hook file in canonical form
    pub fn handle_format(&self) -> Result<()> {
        let hook_set = self.context.config_store().load()?;
        if hook_set.is_empty() {
            print!("{}", crate::store::EMPTY_DOCUMENT);
            return Ok(());
        }
        print!("{}", hooks::serialize(&hook_set)?);
        Ok(())
    }

    fn report_advisories(&self, raw: &str) {
        match hooks::parse(raw) {
            Ok(hook_set) => {
                for finding in hooks::create_default_validator().inspect(&hook_set) {
                    eprintln!("{}", finding);
                }
            }
            Err(e) => {
                warn!(error = %e, "Saved document does not match the hook schema");
                eprintln!("warning: saved document is not a hook list: {}", e);
            }
        }
        debug!("Advisory lint finished");
    }
}

fn count_errors(findings: &[Finding]) -> usize {
    findings
        .iter()
        .filter(|finding| finding.severity == Severity::Error)
        .count()
}

fn render_hook(hook: &Hook) -> String {
    let mut out = String::new();
    let id = if hook.id.is_empty() { "(no id)" } else { hook.id.as_str() };
    let _ = writeln!(out, "{}", id);

    let command = if hook.execute_command.is_empty() {
        "(none)"
    } else {
        hook.execute_command.as_str()
    };
    let _ = writeln!(out, "  command:   {}", command);
    if let Some(dir) = &hook.command_working_directory {
        let _ = writeln!(out, "  workdir:   {}", dir);
    }
    if !hook.http_methods.is_empty() {
        let _ = writeln!(out, "  methods:   {}", hook.http_methods.join(", "));
    }
    if !hook.pass_arguments_to_command.is_empty() {
        let _ = writeln!(out, "  arguments: {}", describe_arguments(&hook.pass_arguments_to_command));
    }
    if !hook.pass_environment_to_command.is_empty() {
        let _ = writeln!(out, "  env:       {}", describe_arguments(&hook.pass_environment_to_command));
    }
    if !hook.pass_file_to_command.is_empty() {
        let _ = writeln!(out, "  files:     {}", describe_arguments(&hook.pass_file_to_command));
    }

    match &hook.trigger_rule {
        None => {
            let _ = writeln!(out, "  trigger:   always");
        }
        Some(rule) => {
            let _ = writeln!(out, "  trigger:");
            render_rule(rule, 2, &mut out);
        }
    }
    out
}

fn render_rule(rule: &TriggerRule, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match rule {
        TriggerRule::Empty => {
            let _ = writeln!(out, "{}always", indent);
        }
        TriggerRule::Match(m) => {
            let _ = writeln!(out, "{}{}", indent, describe_match(m));
        }
        TriggerRule::Mixed(branches) => {
            let _ = writeln!(
                out,
                "{}mixed ({} branches, dispatcher behavior undefined)",
                indent,
                branches.populated()
            );
            for child in rule.children() {
                render_rule(child, depth + 1, out);
            }
            if let Some(m) = &branches.match_rule {
                let _ = writeln!(out, "{}  {}", indent, describe_match(m));
            }
        }
        TriggerRule::And(_) | TriggerRule::Or(_) | TriggerRule::Not(_) => {
            let _ = writeln!(out, "{}{}", indent, rule.kind().unwrap_or_default());
            for child in rule.children() {
                render_rule(child, depth + 1, out);
            }
        }
    }
}

fn describe_argument(argument: &Argument) -> String {
    let source = argument
        .source
        .as_ref()
        .map(|s| s.as_str())
        .unwrap_or("?");
    let mut text = format!("{}:{}", source, argument.name);
    if let Some(envname) = &argument.envname {
        let _ = write!(text, " -> {}", envname);
    }
    text
}

fn describe_arguments(arguments: &[Argument]) -> String {
    arguments
        .iter()
        .map(describe_argument)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_match(rule: &MatchRule) -> String {
    let Some(match_type) = &rule.match_type else {
        return "match (no type)".to_string();
    };
    let mut text = match match_type {
        MatchType::Value => format!("value {:?}", rule.value),
        MatchType::Regex => format!("regex /{}/", rule.regex),
        MatchType::IpWhitelist => format!("ip-whitelist {}", rule.ip_range),
        other if other.needs_secret() => {
            let secret = if rule.secret.is_empty() { "no secret" } else { "secret set" };
            format!("{} ({})", other, secret)
        }
        other => other.to_string(),
    };
    if !rule.parameter.is_empty() {
        let _ = write!(text, " on {}", describe_argument(&rule.parameter));
    }
    text
}

super::traits::impl_context_handler!(ConfigHandler<'a>);
