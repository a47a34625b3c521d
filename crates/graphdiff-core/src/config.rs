//! Comparison configuration.
//!
//! [`DiffConfig`] answers, for a given [`Path`], whether the node is ignored,
//! which strategy is forced on it, and which states are visible there. It is
//! built once (by [`ObjectDifferBuilder`](crate::ObjectDifferBuilder) or from
//! a TOML document) and only read during a comparison.
//!
//! # File format
//!
//! ```toml
//! primitive_defaults = "unassigned"
//! ignore_types = ["Timestamp"]
//!
//! # Optional. When present, every state must be listed.
//! [returnable]
//! added = true
//! removed = true
//! changed = true
//! circular = true
//! untouched = false
//! ignored = false
//!
//! [[paths]]
//! path = "/audit"
//! ignore = true
//!
//! [[paths]]
//! path = "/tags"
//! strategy = "value"
//! returnable = { untouched = true }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use graphdiff_model::{Path, ValueType};

use crate::error::{DiffError, DiffResult};
use crate::state::State;

/// Per-state visibility of nodes.
///
/// Defaults: `Ignored` and `Untouched` are hidden, every other state is
/// visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReturnPolicy {
    settings: [bool; 6],
}

impl Default for ReturnPolicy {
    fn default() -> Self {
        let mut settings = [true; 6];
        settings[State::Ignored.index()] = false;
        settings[State::Untouched.index()] = false;
        Self { settings }
    }
}

impl ReturnPolicy {
    /// Build a policy from an explicit table.
    ///
    /// Fails if any state is missing from `settings`.
    pub fn from_settings(settings: &BTreeMap<State, bool>) -> DiffResult<Self> {
        let missing: Vec<State> = State::ALL
            .into_iter()
            .filter(|state| !settings.contains_key(state))
            .collect();
        if !missing.is_empty() {
            return Err(DiffError::IncompleteReturnPolicy { missing });
        }
        let mut policy = Self::default();
        for (state, enabled) in settings {
            policy.set(*state, *enabled);
        }
        Ok(policy)
    }

    pub fn is_returnable(&self, state: State) -> bool {
        self.settings[state.index()]
    }

    pub fn set(&mut self, state: State, enabled: bool) {
        self.settings[state.index()] = enabled;
    }

    /// Show nodes in `state`.
    pub fn return_state(mut self, state: State) -> Self {
        self.set(state, true);
        self
    }

    /// Hide nodes in `state`.
    pub fn omit_state(mut self, state: State) -> Self {
        self.set(state, false);
        self
    }
}

/// How primitive values equal to their type's default are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveDefaultMode {
    /// Defaults are ordinary values: `0 -> 5` is `Changed`.
    #[default]
    Assigned,
    /// Defaults count as "never assigned": `0 -> 5` is `Added`.
    Unassigned,
}

/// A strategy forced on a path, bypassing type-driven selection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Compare by equality only, without recursing.
    Value,
    /// Compare member by member.
    Members,
    /// Compare as an ordered sequence.
    Sequence,
    /// Compare as a keyed mapping.
    Mapping,
    /// Compare as a set.
    Set,
    /// A registered custom strategy, by name.
    Custom(String),
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Members => f.write_str("members"),
            Self::Sequence => f.write_str("sequence"),
            Self::Mapping => f.write_str("mapping"),
            Self::Set => f.write_str("set"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(Self::Value),
            "members" => Ok(Self::Members),
            "sequence" => Ok(Self::Sequence),
            "mapping" => Ok(Self::Mapping),
            "set" => Ok(Self::Set),
            other => match other.strip_prefix("custom:") {
                Some(name) if !name.is_empty() => Ok(Self::Custom(name.to_string())),
                _ => Err(DiffError::Config(format!("unknown strategy: {other:?}"))),
            },
        }
    }
}

/// Settings attached to one path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathOverrides {
    /// Mark the node `Ignored` and skip it.
    pub ignore: bool,
    /// Strategy to use instead of the type-driven choice.
    pub strategy: Option<StrategyKind>,
    /// Visibility overrides for this path only.
    pub returnable: BTreeMap<State, bool>,
}

/// Configuration consulted once per node during a comparison.
#[derive(Clone, Debug, Default)]
pub struct DiffConfig {
    returnable: ReturnPolicy,
    primitive_defaults: PrimitiveDefaultMode,
    paths: HashMap<Path, PathOverrides>,
    ignored_types: HashSet<String>,
}

impl DiffConfig {
    /// The default configuration: nothing ignored, no forced strategies,
    /// default return policy, defaults treated as assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides configured for exactly `path`.
    pub fn overrides(&self, path: &Path) -> Option<&PathOverrides> {
        self.paths.get(path)
    }

    /// Returns `true` if the node at `path` holding a value of `value_type`
    /// must be marked `Ignored`.
    pub fn is_ignored(&self, path: &Path, value_type: Option<&ValueType>) -> bool {
        if self.overrides(path).is_some_and(|o| o.ignore) {
            return true;
        }
        value_type.is_some_and(|t| self.ignored_types.contains(t.name()))
    }

    pub fn forced_strategy(&self, path: &Path) -> Option<&StrategyKind> {
        self.overrides(path).and_then(|o| o.strategy.as_ref())
    }

    pub fn return_policy(&self) -> &ReturnPolicy {
        &self.returnable
    }

    pub fn primitive_defaults(&self) -> PrimitiveDefaultMode {
        self.primitive_defaults
    }

    /// Whether `state` is visible at `path`, after path overrides.
    pub fn is_returnable_at(&self, path: &Path, state: State) -> bool {
        self.overrides(path)
            .and_then(|o| o.returnable.get(&state).copied())
            .unwrap_or_else(|| self.returnable.is_returnable(state))
    }

    pub(crate) fn path_returnable_overrides(&self) -> impl Iterator<Item = (&Path, &BTreeMap<State, bool>)> {
        self.paths
            .iter()
            .filter(|(_, o)| !o.returnable.is_empty())
            .map(|(path, o)| (path, &o.returnable))
    }

    pub fn ignore_path(&mut self, path: Path) {
        self.paths.entry(path).or_default().ignore = true;
    }

    pub fn ignore_type(&mut self, type_name: impl Into<String>) {
        self.ignored_types.insert(type_name.into());
    }

    pub fn force_strategy(&mut self, path: Path, strategy: StrategyKind) {
        self.paths.entry(path).or_default().strategy = Some(strategy);
    }

    pub fn return_state_at(&mut self, path: Path, state: State, enabled: bool) {
        self.paths.entry(path).or_default().returnable.insert(state, enabled);
    }

    pub fn set_return_policy(&mut self, policy: ReturnPolicy) {
        self.returnable = policy;
    }

    pub fn set_primitive_defaults(&mut self, mode: PrimitiveDefaultMode) {
        self.primitive_defaults = mode;
    }

    /// Parse a TOML configuration document.
    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))?;
        file.into_config()
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DiffResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    returnable: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    primitive_defaults: PrimitiveDefaultMode,
    #[serde(default)]
    ignore_types: Vec<String>,
    #[serde(default)]
    paths: Vec<PathEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathEntry {
    path: String,
    #[serde(default)]
    ignore: bool,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    returnable: BTreeMap<String, bool>,
}

fn parse_state_table(table: BTreeMap<String, bool>) -> DiffResult<BTreeMap<State, bool>> {
    table
        .into_iter()
        .map(|(name, enabled)| -> DiffResult<(State, bool)> { Ok((name.parse::<State>()?, enabled)) })
        .collect()
}

impl ConfigFile {
    fn into_config(self) -> DiffResult<DiffConfig> {
        let mut config = DiffConfig::new();
        if let Some(table) = self.returnable {
            config.set_return_policy(ReturnPolicy::from_settings(&parse_state_table(table)?)?);
        }
        config.set_primitive_defaults(self.primitive_defaults);
        for type_name in self.ignore_types {
            config.ignore_type(type_name);
        }
        for entry in self.paths {
            let path = Path::parse(&entry.path)?;
            let strategy: Option<StrategyKind> = entry
                .strategy
                .as_deref()
                .map(str::parse::<StrategyKind>)
                .transpose()?;
            let returnable = parse_state_table(entry.returnable)?;
            let overrides = config.paths.entry(path).or_default();
            overrides.ignore |= entry.ignore;
            if strategy.is_some() {
                overrides.strategy = strategy;
            }
            overrides.returnable.extend(returnable);
        }
        Ok(config)
    }
}
