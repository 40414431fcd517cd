//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "roster.toml")]
    pub output: String,

    /// Include commented examples of every optional setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Roster configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your root account and reports", self.output);
                println!("  2. Set ROSTER_DATABASE_URL (or put it in a .env file)");
                println!("  3. Validate configuration: roster validate-config");
                println!("  4. Run export: roster export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Roster Configuration File
# LMS enrollment data exporter

[application]
log_level = "info"

[database]
connection_string = "${ROSTER_DATABASE_URL}"

[report]
root_account_id = 1
reports = ["users", "accounts", "terms", "courses", "sections", "enrollments"]
format = "sis"

[output]
directory = "./reports"
"#
        .to_string()
    }

    /// Generate configuration with every setting spelled out
    fn generate_config_with_examples() -> String {
        r#"# Roster Configuration File
# LMS enrollment data exporter
#
# ${VAR} placeholders are replaced from the environment (a .env file is
# loaded first). Any key can also be overridden with ROSTER_<SECTION>_<KEY>,
# for example ROSTER_REPORT_FORMAT=provisioning.

[application]
log_level = "info"           # trace | debug | info | warn | error
dry_run = false              # count rows, write no files

[database]
connection_string = "${ROSTER_DATABASE_URL}"
max_connections = 4
connection_timeout_seconds = 30
statement_timeout_seconds = 300
ssl_mode = "prefer"          # disable | allow | prefer | require | verify-ca | verify-full

[report]
root_account_id = 1
# sub_account_id = 12        # restrict to one sub-account tree
# term_id = 5                # restrict course-bearing reports to one term

# Catalog: users accounts terms courses sections enrollments groups
#          group_membership group_categories xlist user_observers
# Unknown names are ignored.
reports = ["users", "accounts", "terms", "courses", "sections", "enrollments"]

format = "sis"               # sis | provisioning
created_by_sis = false       # only records created by an SIS import
include_deleted = false      # include soft-deleted records with external ids
unresolved_login_policy = "skip"   # skip | fail

# Provisioning header overrides
# [report.header_labels]
# canvas_user_id = "Canvas User ID"

[output]
directory = "./reports"
delimiter = ","
write_manifest = true

[logging]
local_enabled = false
local_path = "/var/log/roster"
local_rotation = "daily"     # daily | hourly | never
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_str, ENV_MUTEX};

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "roster.toml".to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.output, "roster.toml");
    }

    #[test]
    fn test_generated_configs_parse() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("ROSTER_DATABASE_URL", "postgresql://roster:pw@localhost/lms");
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = load_config_str(&content).unwrap();
            assert_eq!(config.report.root_account_id, 1);
            assert_eq!(config.report.reports.len(), 6);
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = InitArgs {
            output: file.path().to_str().unwrap().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
    }
}
