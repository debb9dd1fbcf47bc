//! Rule compilation and text substitution.
//!
//! Rules are loaded from a TOML or YAML rule file and compiled eagerly, so an
//! invalid pattern or scope glob fails the whole run before any file is
//! touched. `apply_rule` is pure and performs a global, non-overlapping
//! substitution.

use crate::error::{Result, RewriteError};
use crate::models::rules::{RuleDef, RuleFile};
use glob::{MatchOptions, Pattern};
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// How a rule finds and rewrites text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Regular expression with `$n`/`${name}` expansion in the replacement.
    Regex(Regex),
    /// Plain text; replacement inserted verbatim.
    Literal(Regex),
}

impl Matcher {
    fn regex(&self) -> &Regex {
        match self {
            Matcher::Regex(re) | Matcher::Literal(re) => re,
        }
    }
}

/// A compiled, immutable rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub scope: Vec<Pattern>,
    pub matcher: Matcher,
    pub replacement: String,
}

/// Result of a single substitution pass.
#[derive(Debug, PartialEq, Eq)]
pub struct Applied<'a> {
    pub content: Cow<'a, str>,
    pub changed: bool,
    pub replacements: usize,
}

const SCOPE_OPTS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl Rule {
    /// Compile a rule definition, validating its pattern and scope globs.
    pub fn compile(def: &RuleDef) -> Result<Rule> {
        let matcher = if def.literal {
            Matcher::Literal(compile_regex(&def.name, &regex::escape(&def.pattern))?)
        } else {
            Matcher::Regex(compile_regex(&def.name, &def.pattern)?)
        };
        let replacement = match &matcher {
            Matcher::Literal(_) => def.replacement.clone(),
            Matcher::Regex(re) => {
                let r = normalize_backrefs(&def.replacement);
                check_references(&def.name, re, &r)?;
                r
            }
        };
        let mut scope = Vec::new();
        for f in def.files.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if f == "*" {
                continue;
            }
            let pat = Pattern::new(f).map_err(|source| RewriteError::Scope {
                rule: def.name.clone(),
                pattern: f.to_string(),
                source,
            })?;
            scope.push(pat);
        }
        Ok(Rule {
            name: def.name.clone(),
            scope,
            matcher,
            replacement,
        })
    }

    pub fn pattern(&self) -> &str {
        self.matcher.regex().as_str()
    }

    /// Whether this rule may modify `rel_path` (path relative to the run root).
    ///
    /// Scope entries match either the file name or the full relative path.
    pub fn in_scope(&self, rel_path: &str) -> bool {
        if self.scope.is_empty() {
            return true;
        }
        let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
        self.scope
            .iter()
            .any(|p| p.matches_with(name, SCOPE_OPTS) || p.matches_with(rel_path, SCOPE_OPTS))
    }

    /// Scope entries without glob metacharacters, i.e. explicit file names.
    pub fn literal_scope(&self) -> impl Iterator<Item = &str> {
        self.scope
            .iter()
            .map(|p| p.as_str())
            .filter(|s| !s.contains(['*', '?', '[']))
    }
}

fn compile_regex(rule: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| RewriteError::Pattern {
        rule: rule.to_string(),
        source,
    })
}

/// Rewrite `\1`-style back-references into `${1}` and escape stray `$`
/// signs that do not start a capture reference.
fn normalize_backrefs(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut num = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        num.push(d);
                        chars.next();
                    }
                    out.push_str("${");
                    out.push_str(&num);
                    out.push('}');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            '$' => match chars.peek().copied() {
                Some(d) if d.is_ascii_alphanumeric() || d == '_' || d == '{' || d == '$' => {
                    out.push('$');
                    if d == '$' {
                        chars.next();
                        out.push('$');
                    }
                }
                _ => out.push_str("$$"),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Reject `$n`, `$name` and `${name}` references to groups `re` does not
/// define; the regex crate would silently expand them to nothing.
fn check_references(rule: &str, re: &Regex, replacement: &str) -> Result<()> {
    let bytes = replacement.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let rest = &replacement[i + 1..];
        let (name, consumed) = if rest.starts_with('$') {
            i += 2;
            continue;
        } else if let Some(body) = rest.strip_prefix('{') {
            match body.find('}') {
                Some(end) => (&body[..end], end + 2),
                None => {
                    i += 1;
                    continue;
                }
            }
        } else {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            (&rest[..end], end)
        };
        if !name.is_empty() && !group_exists(re, name) {
            return Err(RewriteError::Replacement {
                rule: rule.to_string(),
                reference: name.to_string(),
            });
        }
        i += 1 + consumed;
    }
    Ok(())
}

fn group_exists(re: &Regex, name: &str) -> bool {
    match name.parse::<usize>() {
        Ok(idx) => idx < re.captures_len(),
        Err(_) => re.capture_names().flatten().any(|n| n == name),
    }
}

/// Substitute every non-overlapping match of `rule` in `content`.
///
/// Returns the input unchanged (borrowed) with `changed == false` when there
/// is no match.
pub fn apply_rule<'a>(content: &'a str, rule: &Rule) -> Applied<'a> {
    let re = rule.matcher.regex();
    let replacements = re.find_iter(content).count();
    if replacements == 0 {
        return Applied {
            content: Cow::Borrowed(content),
            changed: false,
            replacements: 0,
        };
    }
    let replaced = match &rule.matcher {
        Matcher::Regex(re) => re.replace_all(content, rule.replacement.as_str()),
        Matcher::Literal(re) => re.replace_all(content, NoExpand(&rule.replacement)),
    };
    let changed = replaced != content;
    Applied {
        content: Cow::Owned(replaced.into_owned()),
        changed,
        replacements,
    }
}

/// Parse a rule file by extension: `.yaml|.yml` as YAML, anything else as TOML.
pub fn parse_rule_file(path: &Path, text: &str) -> Result<RuleFile> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str::<RuleFile>(text).map_err(|e| e.to_string())
    } else {
        toml::from_str::<RuleFile>(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| RewriteError::RuleFile {
        path: path.to_path_buf(),
        message,
    })
}

/// Load and compile all rules from `path`, failing on the first invalid one.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    let text = fs::read_to_string(path).map_err(|e| RewriteError::RuleFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let file = parse_rule_file(path, &text)?;
    compile_all(&file.rules)
}

pub fn compile_all(defs: &[RuleDef]) -> Result<Vec<Rule>> {
    defs.iter().map(Rule::compile).collect()
}
