//! Rule file schema: a list of named find/replace records.

use serde::Deserialize;

#[derive(Deserialize, Default)]
/// Top-level rule definition file (`[[rules]]` in TOML, `rules:` in YAML).
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

#[derive(Deserialize, Clone)]
/// A single rule entry as written in the rule file.
pub struct RuleDef {
    pub name: String,
    /// File name or relative path globs; empty means every discovered file.
    #[serde(default)]
    pub files: Vec<String>,
    pub pattern: String,
    pub replacement: String,
    /// Treat `pattern` and `replacement` as plain text.
    #[serde(default)]
    pub literal: bool,
}
