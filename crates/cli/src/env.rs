use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CliError;

/// Environment variable manager that loads from system and .env files.
///
/// Variables already set in the process environment take precedence over
/// the ones read from a file. Within a file, the last assignment of a key wins.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    pub fn from_system() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Load variables from a .env file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Env(format!("failed to read {}: {}", path.display(), e)))?;

        self.parse_env_content(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.vars
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), CliError> {
        let mut parsed = HashMap::new();
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(CliError::Env(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Env(format!("empty key at line {}", line_num + 1)));
            }

            parsed.insert(key.to_string(), Self::unquote_value(value));
        }

        for (key, value) in parsed {
            self.vars.entry(key).or_insert(value);
        }
        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        for quote in ['"', '\''] {
            if let Some(inner) = value
                .strip_prefix(quote)
                .and_then(|v| v.strip_suffix(quote))
            {
                return inner.to_string();
            }
        }

        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_env() {
        let mut env = EnvManager::default();
        let content = r#"
# Comment
SPARQL_ENDPOINT=https://data-issa.cirad.fr/sparql
export DUMP_OUTPUT_DIR=data
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(
            env.get("SPARQL_ENDPOINT"),
            Some("https://data-issa.cirad.fr/sparql")
        );
        assert_eq!(env.get("DUMP_OUTPUT_DIR"), Some("data"));
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = EnvManager::default();
        let content = r#"
QUOTED="value with spaces"
SINGLE='single quoted'
UNQUOTED=no_spaces
LONE="
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("QUOTED"), Some("value with spaces"));
        assert_eq!(env.get("SINGLE"), Some("single quoted"));
        assert_eq!(env.get("UNQUOTED"), Some("no_spaces"));
        assert_eq!(env.get("LONE"), Some("\""));
    }

    #[test]
    fn test_existing_variables_win() {
        let mut env = EnvManager::default();
        env.vars.insert("SEARCH_MAX_AUTOCOMPLETE".into(), "20".into());

        env.parse_env_content("SEARCH_MAX_AUTOCOMPLETE=5").unwrap();
        assert_eq!(env.get("SEARCH_MAX_AUTOCOMPLETE"), Some("20"));
    }

    #[test]
    fn test_later_lines_override_earlier() {
        let mut env = EnvManager::default();
        env.vars.insert("SPARQL_ENDPOINT".into(), "http://process".into());
        let content = r#"
DUMP_OUTPUT_DIR=first
SPARQL_ENDPOINT=http://file-one
DUMP_OUTPUT_DIR=second
SPARQL_ENDPOINT=http://file-two
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("DUMP_OUTPUT_DIR"), Some("second"));
        assert_eq!(env.get("SPARQL_ENDPOINT"), Some("http://process"));
    }

    #[test]
    fn test_malformed_file_sets_nothing() {
        let mut env = EnvManager::default();
        assert!(env.parse_env_content("DUMP_OUTPUT_DIR=data\nBROKEN").is_err());
        assert_eq!(env.get("DUMP_OUTPUT_DIR"), None);
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = EnvManager::default();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "DUMP_TEST_ONLY_KEY=from-file\n").unwrap();

        let mut env = EnvManager::default();
        env.load_from_file(&path).unwrap();
        assert_eq!(env.get("DUMP_TEST_ONLY_KEY"), Some("from-file"));
        assert!(env.load_from_file(tmp.path().join("missing.env")).is_err());
    }
}
