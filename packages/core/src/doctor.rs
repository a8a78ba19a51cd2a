// hachivsd Doctor Module
//
// Checks that a sync can run: configuration, mandatory fields, Vault access
// and the output base path.

use std::path::Path;

use crate::config::Config;
use crate::vault::VaultClient;

/// Result of one doctor check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Run every check. Later checks are skipped when the configuration is
/// unusable.
pub async fn run_checks(config_path: Option<&Path>) -> Vec<Check> {
    let mut checks = Vec::new();

    let config = match Config::load(config_path) {
        Ok(config) => {
            checks.push(Check::pass("configuration", "configuration file loaded"));
            config
        }
        Err(e) => {
            checks.push(Check::fail("configuration", e.to_string()));
            return checks;
        }
    };

    let settings = match config.vault_settings() {
        Ok(settings) => settings,
        Err(e) => {
            checks.push(Check::fail("mandatory fields", e.to_string()));
            return checks;
        }
    };
    let basepath = match config.basepath() {
        Ok(basepath) => basepath,
        Err(e) => {
            checks.push(Check::fail("mandatory fields", e.to_string()));
            return checks;
        }
    };
    checks.push(Check::pass("mandatory fields", "all mandatory options set"));

    let access = match VaultClient::new(&settings) {
        Ok(client) => match client.list_secrets().await {
            Ok(names) => Check::pass(
                "vault access",
                format!("{} secret(s) listed in '{}'", names.len(), settings.engine),
            ),
            Err(e) => Check::fail("vault access", e.to_string()),
        },
        Err(e) => Check::fail("vault access", e.to_string()),
    };
    checks.push(access);

    let base = Path::new(basepath);
    checks.push(if base.is_dir() {
        Check::pass("base path", format!("{} exists", base.display()))
    } else if base.exists() {
        Check::fail("base path", format!("{} is not a directory", base.display()))
    } else {
        Check::pass("base path", format!("{} will be created", base.display()))
    });

    checks
}
