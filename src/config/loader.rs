//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RosterConfig;
use super::secret::secret_string;
use crate::domain::errors::RosterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`RosterConfig`]
/// 4. Applies environment variable overrides (`ROSTER_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`RosterError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// fails.
///
/// # Examples
///
/// ```no_run
/// use roster::config::loader::load_config;
///
/// let config = load_config("roster.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RosterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RosterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RosterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Same as [`load_config`] for configuration text already in memory
pub fn load_config_str(contents: &str) -> Result<RosterConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: RosterConfig = toml::from_str(&contents)
        .map_err(|e| RosterError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RosterError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched. Every missing variable is reported in
/// one error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in PLACEHOLDER.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RosterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RosterError::Configuration(format!("Invalid value for {name}: {e}")))
}

/// Applies environment variable overrides using the `ROSTER_*` prefix
///
/// Variables follow the pattern `ROSTER_<SECTION>_<KEY>`, for example
/// `ROSTER_DATABASE_CONNECTION_STRING` or `ROSTER_REPORT_TERM_ID`.
fn apply_env_overrides(config: &mut RosterConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    // Application overrides
    if let Some(val) = var("ROSTER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = var("ROSTER_APPLICATION_DRY_RUN") {
        config.application.dry_run = crate::domain::value_to_boolean(&val);
    }

    // Database overrides
    if let Some(val) = var("ROSTER_DATABASE_CONNECTION_STRING") {
        config.database.connection_string = secret_string(val);
    }
    if let Some(val) = var("ROSTER_DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections = parse_override("ROSTER_DATABASE_MAX_CONNECTIONS", &val)?;
    }
    if let Some(val) = var("ROSTER_DATABASE_STATEMENT_TIMEOUT_SECONDS") {
        config.database.statement_timeout_seconds =
            parse_override("ROSTER_DATABASE_STATEMENT_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = var("ROSTER_DATABASE_SSL_MODE") {
        config.database.ssl_mode = val;
    }

    // Report overrides
    if let Some(val) = var("ROSTER_REPORT_ROOT_ACCOUNT_ID") {
        config.report.root_account_id = parse_override("ROSTER_REPORT_ROOT_ACCOUNT_ID", &val)?;
    }
    if let Some(val) = var("ROSTER_REPORT_SUB_ACCOUNT_ID") {
        config.report.sub_account_id =
            Some(parse_override("ROSTER_REPORT_SUB_ACCOUNT_ID", &val)?);
    }
    if let Some(val) = var("ROSTER_REPORT_TERM_ID") {
        config.report.term_id = Some(parse_override("ROSTER_REPORT_TERM_ID", &val)?);
    }
    if let Some(val) = var("ROSTER_REPORT_REPORTS") {
        config.report.reports = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(val) = var("ROSTER_REPORT_FORMAT") {
        config.report.format = parse_override("ROSTER_REPORT_FORMAT", &val)?;
    }
    if let Some(val) = var("ROSTER_REPORT_CREATED_BY_SIS") {
        config.report.created_by_sis = crate::domain::value_to_boolean(&val);
    }
    if let Some(val) = var("ROSTER_REPORT_INCLUDE_DELETED") {
        config.report.include_deleted = crate::domain::value_to_boolean(&val);
    }
    if let Some(val) = var("ROSTER_REPORT_UNRESOLVED_LOGIN_POLICY") {
        config.report.unresolved_login_policy =
            parse_override("ROSTER_REPORT_UNRESOLVED_LOGIN_POLICY", &val)?;
    }

    // Output overrides
    if let Some(val) = var("ROSTER_OUTPUT_DIRECTORY") {
        config.output.directory = val;
    }
    if let Some(val) = var("ROSTER_OUTPUT_DELIMITER") {
        config.output.delimiter = val;
    }

    // Logging overrides
    if let Some(val) = var("ROSTER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = crate::domain::value_to_boolean(&val);
    }
    if let Some(val) = var("ROSTER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = var("ROSTER_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use crate::config::ENV_MUTEX;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[database]
connection_string = "postgresql://roster:pw@localhost/lms"

[report]
root_account_id = 1
reports = ["users", "courses"]
"#;

    #[test]
    fn test_substitute_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("ROSTER_TEST_VAR", "test_value");
        let input = "password = \"${ROSTER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("ROSTER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing_lists_all() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::remove_var("ROSTER_MISSING_A");
        std::env::remove_var("ROSTER_MISSING_B");
        let input = "a = \"${ROSTER_MISSING_A}\"\nb = \"${ROSTER_MISSING_B}\"";
        let err = substitute_env_vars(input).unwrap_err().to_string();
        assert!(err.contains("ROSTER_MISSING_A"));
        assert!(err.contains("ROSTER_MISSING_B"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::remove_var("ROSTER_NOT_SET");
        let input = "# password = \"${ROSTER_NOT_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(RosterError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.report.root_account_id, 1);
        assert_eq!(config.report.reports, vec!["users", "courses"]);
        assert_eq!(config.output.directory, "./reports");
        assert_eq!(config.database.max_connections, 4);
        assert!(config
            .database
            .connection_string
            .expose_secret()
            .starts_with("postgresql://"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("ROSTER_REPORT_TERM_ID", "12");
        std::env::set_var("ROSTER_REPORT_FORMAT", "sis");
        std::env::set_var("ROSTER_REPORT_REPORTS", "terms, xlist");

        let config = load_config_str(MINIMAL);

        std::env::remove_var("ROSTER_REPORT_TERM_ID");
        std::env::remove_var("ROSTER_REPORT_FORMAT");
        std::env::remove_var("ROSTER_REPORT_REPORTS");

        let config = config.unwrap();
        assert_eq!(config.report.term_id, Some(12));
        assert!(config.report.format.is_strict());
        assert_eq!(config.report.reports, vec!["terms", "xlist"]);
    }

    #[test]
    fn test_boolean_overrides_accept_common_spellings() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("ROSTER_APPLICATION_DRY_RUN", "yes");
        std::env::set_var("ROSTER_LOGGING_LOCAL_ENABLED", "no");

        let config = load_config_str(MINIMAL);

        std::env::remove_var("ROSTER_APPLICATION_DRY_RUN");
        std::env::remove_var("ROSTER_LOGGING_LOCAL_ENABLED");

        let config = config.unwrap();
        assert!(config.application.dry_run);
        assert!(!config.logging.local_enabled);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("ROSTER_REPORT_TERM_ID", "abc");
        let result = load_config_str(MINIMAL);
        std::env::remove_var("ROSTER_REPORT_TERM_ID");
        assert!(matches!(result, Err(RosterError::Configuration(_))));
    }

    #[test]
    fn test_validation_failure() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let bad = MINIMAL.replace("root_account_id = 1", "root_account_id = 0");
        let err = load_config_str(&bad).unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }
}
