//! Session settings read from a task document:
//!
//! ```text
//! variables
//!   x: 3.0
//!   a: 0.5
//! derivative
//!   with_respect_to: x
//! optimization
//!   passes: fold, identities
//!   until_stable: true
//!   max_rounds: 16
//! logging
//!   level: info
//!   file: diff.log
//! ```
//! Every section is optional. Without a `variables` section the session binds `x = 0`;
//! a `variables` section replaces that default entirely.
use crate::Utils::logger::init_logger;
use crate::Utils::task_parser::{DocumentMap, Value, parse_document_as};
use crate::symbolic::operators::VariableBindings;
use crate::symbolic::tree_simplify::OptimizationPass;
use log::LevelFilter;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LAYOUT: &[(&str, &[&str])] = &[
    ("variables", &[]),
    ("derivative", &["with_respect_to"]),
    ("optimization", &["passes", "until_stable", "max_rounds"]),
    ("logging", &["level", "file"]),
];

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    /// the text is not a well-formed task document
    Document(String),
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

impl ConfigError {
    fn invalid(section: &str, key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Cannot read session file: {}", err),
            ConfigError::Document(msg) => write!(f, "Malformed session file: {}", msg),
            ConfigError::InvalidValue {
                section,
                key,
                message,
            } => write!(f, "Invalid value for {}.{}: {}", section, key, message),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub variables: VariableBindings,
    pub with_respect_to: String,
    pub passes: Vec<OptimizationPass>,
    pub until_stable: bool,
    /// round limit used when `until_stable` is set
    pub max_rounds: usize,
    pub log_level: LevelFilter,
    pub log_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut variables = VariableBindings::new();
        variables.insert("x".to_string(), 0.0);
        SessionConfig {
            variables,
            with_respect_to: "x".to_string(),
            passes: OptimizationPass::standard(),
            until_stable: false,
            max_rounds: 16,
            log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

/// exactly one value under `section.key`
fn single<'d>(values: &'d [Value], section: &str, key: &str) -> Result<&'d Value, ConfigError> {
    match values {
        [value] => Ok(value),
        _ => Err(ConfigError::invalid(
            section,
            key,
            format!("expected one value, found {}", values.len()),
        )),
    }
}

fn lookup<'d>(document: &'d DocumentMap, section: &str, key: &str) -> Option<&'d [Value]> {
    document
        .get(section)
        .and_then(|entries| entries.get(key))
        .map(Vec::as_slice)
}

impl SessionConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        text.parse()
    }

    /// Copy of the configured variable values.
    pub fn bindings(&self) -> VariableBindings {
        self.variables.clone()
    }

    /// Installs the configured log sinks; `Ok(false)` if a logger was already installed.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        Ok(init_logger(self.log_level, self.log_file.as_deref())?)
    }

    fn read_variables(&mut self, document: &DocumentMap) -> Result<(), ConfigError> {
        let Some(section) = document.get("variables") else {
            return Ok(());
        };
        self.variables.clear();
        for (name, values) in section {
            let val = single(values, "variables", name)?
                .as_number()
                .ok_or_else(|| ConfigError::invalid("variables", name, "expected a number"))?;
            self.variables.insert(name.clone(), val);
        }
        Ok(())
    }

    fn read_derivative(&mut self, document: &DocumentMap) -> Result<(), ConfigError> {
        if let Some(values) = lookup(document, "derivative", "with_respect_to") {
            self.with_respect_to =
                single(values, "derivative", "with_respect_to")?.to_string_value();
        }
        if !self.variables.contains_key(&self.with_respect_to) {
            return Err(ConfigError::invalid(
                "derivative",
                "with_respect_to",
                format!("'{}' is not among the variables", self.with_respect_to),
            ));
        }
        Ok(())
    }

    fn read_optimization(&mut self, document: &DocumentMap) -> Result<(), ConfigError> {
        if let Some(values) = lookup(document, "optimization", "passes") {
            self.passes = values
                .iter()
                .map(|value| {
                    value.to_string_value().parse::<OptimizationPass>().map_err(|_| {
                        ConfigError::invalid(
                            "optimization",
                            "passes",
                            format!("unknown pass '{}'", value),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(values) = lookup(document, "optimization", "until_stable") {
            self.until_stable = single(values, "optimization", "until_stable")?
                .as_boolean()
                .ok_or_else(|| {
                    ConfigError::invalid("optimization", "until_stable", "expected true or false")
                })?;
        }
        if let Some(values) = lookup(document, "optimization", "max_rounds") {
            self.max_rounds = single(values, "optimization", "max_rounds")?
                .as_integer()
                .and_then(|rounds| usize::try_from(rounds).ok())
                .filter(|rounds| *rounds > 0)
                .ok_or_else(|| {
                    ConfigError::invalid("optimization", "max_rounds", "expected a positive integer")
                })?;
        }
        Ok(())
    }

    fn read_logging(&mut self, document: &DocumentMap) -> Result<(), ConfigError> {
        if let Some(values) = lookup(document, "logging", "level") {
            let text = single(values, "logging", "level")?.to_string_value();
            self.log_level = text.parse::<LevelFilter>().map_err(|_| {
                ConfigError::invalid("logging", "level", format!("unknown level '{}'", text))
            })?;
        }
        if let Some(values) = lookup(document, "logging", "file") {
            let path = single(values, "logging", "file")?.to_string_value();
            self.log_file = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

impl FromStr for SessionConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let document = parse_document_as(text, Some(LAYOUT)).map_err(ConfigError::Document)?;
        let mut config = SessionConfig::default();
        config.read_variables(&document)?;
        config.read_derivative(&document)?;
        config.read_optimization(&document)?;
        config.read_logging(&document)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const FULL: &str = r#"
        # differentiation session
        variables
          x: 3.0
          a: 2
        derivative
          with_respect_to: x
        optimization
          passes: identities, fold
          until_stable: true
          max_rounds: 4
        logging
          level: debug
          file: diff.log
    "#;

    #[test]
    fn test_defaults() {
        let config: SessionConfig = "".parse().unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.bindings().get("x"), Some(&0.0));
        assert_eq!(config.with_respect_to, "x");
        assert_eq!(
            config.passes,
            vec![OptimizationPass::ConstantFolding, OptimizationPass::IdentityElimination]
        );
        assert!(!config.until_stable);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_full_document() {
        let config: SessionConfig = FULL.parse().unwrap();
        assert_eq!(config.variables.len(), 2);
        assert_eq!(config.variables["x"], 3.0);
        // integers are accepted as numbers
        assert_eq!(config.variables["a"], 2.0);
        assert_eq!(
            config.passes,
            vec![OptimizationPass::IdentityElimination, OptimizationPass::ConstantFolding]
        );
        assert!(config.until_stable);
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_file, Some(PathBuf::from("diff.log")));
    }

    #[test]
    fn test_variables_replace_default() {
        let config: SessionConfig = "variables\n t: 1.5\nderivative\n with_respect_to: t"
            .parse()
            .unwrap();
        assert_eq!(config.variables.len(), 1);
        assert_eq!(config.with_respect_to, "t");
    }

    #[test]
    fn test_unbound_differentiation_variable() {
        let err = "variables\n t: 1.5".parse::<SessionConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "with_respect_to"));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            "variables\n x: abc",
            "variables\n x: 1, 2",
            "optimization\n passes: fold, expand",
            "optimization\n until_stable: maybe",
            "optimization\n max_rounds: 0",
            "optimization\n max_rounds: 2.5",
            "logging\n level: loud",
        ];
        for text in cases {
            let err = text.parse::<SessionConfig>().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{}", text);
        }
    }

    #[test]
    fn test_unknown_section_or_key() {
        let err = "optimisation\n passes: fold".parse::<SessionConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Document(_)));
        let err = "logging\n colour: red".parse::<SessionConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Document(_)));
    }

    #[test]
    fn test_error_display() {
        let err = "logging\n level: loud".parse::<SessionConfig>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for logging.level: unknown level 'loud'"
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.variables["x"], 3.0);

        let err = SessionConfig::from_file(dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
