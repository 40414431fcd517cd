//! Reports command implementation
//!
//! Prints the report catalog with each report's header contract.

use crate::core::report::{self, ReportContext, Scope};
use crate::domain::{AccountId, AccountRecord, ReportFormat, ReportKind};
use clap::Args;
use std::str::FromStr;

/// Arguments for the reports command
#[derive(Args, Debug)]
pub struct ReportsArgs {
    /// Output format whose headers to show (sis or provisioning)
    #[arg(long, default_value = "sis")]
    pub format: String,

    /// Show the trailing column federated roots add to enrollments
    #[arg(long)]
    pub federated: bool,
}

impl ReportsArgs {
    /// Header rows of every catalog entry, `None` for unavailable reports
    pub fn catalog(
        format: ReportFormat,
        federated: bool,
    ) -> anyhow::Result<Vec<(ReportKind, Option<Vec<String>>)>> {
        let root = AccountRecord {
            id: AccountId::new(1).map_err(anyhow::Error::msg)?,
            root_account_id: None,
            parent_account_id: None,
            name: String::new(),
            domain: None,
        };
        let mut scope = Scope::root_only(root);
        if federated {
            scope.trusted_accounts = vec![AccountId::new(2).map_err(anyhow::Error::msg)?];
        }
        let ctx = ReportContext::new(format, scope);

        Ok(ReportKind::CATALOG
            .iter()
            .map(|kind| (*kind, report::headers(*kind, &ctx)))
            .collect())
    }

    /// Execute the reports command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let format = match ReportFormat::from_str(&self.format) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        println!("📋 Report catalog ({format} format)");
        println!();
        for (kind, headers) in Self::catalog(format, self.federated)? {
            match headers {
                Some(headers) => println!("  {:<18} {}", kind, headers.join(",")),
                None => println!("  {kind:<18} (not available in {format} format)"),
            }
        }
        println!();
        Ok(0)
    }
}
