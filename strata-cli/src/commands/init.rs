//! `strata init` command - Initialize a new Strata project.

use crate::cli::InitArgs;
use crate::config::{CONFIG_FILE_NAME, Config, SCHEMA_FILE_NAME};
use crate::error::{CliError, CliResult};
use crate::output::{self, success};
use crate::store::FileSchemaStore;

/// Run the init command
pub async fn run(args: InitArgs) -> CliResult<()> {
    output::header("Initialize Strata Project");

    let project_path = args
        .path
        .canonicalize()
        .unwrap_or_else(|_| args.path.clone());

    let config_path = project_path.join(CONFIG_FILE_NAME);
    if config_path.exists() && !args.force {
        return Err(CliError::Config(format!(
            "Project already initialized. {} exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    output::step(1, 3, "Creating project directory...");
    std::fs::create_dir_all(&project_path)?;

    output::step(2, 3, "Creating configuration file...");
    let mut config = Config::default();
    if let Some(platform) = args.platform {
        config.instance.platform = platform;
    }
    config.instance.vendor = args.vendor.map(Into::into);
    config.accountability.admin = true;
    config.save(&config_path)?;

    output::step(3, 3, "Creating schema file...");
    let store = FileSchemaStore::new(config.store_path(&config_path));
    if store.path().exists() && !args.force {
        output::warn(&format!("{} already exists, keeping it", SCHEMA_FILE_NAME));
    } else {
        store.write(&config.instance.info().empty_snapshot()).await?;
    }

    output::newline();
    success("Strata project initialized successfully!");
    output::newline();

    output::section("Next steps");
    output::list_item("strata snapshot --hash -o snapshot.json");
    output::list_item("strata diff target.json -o diff.json");
    output::list_item("strata apply diff.json");
    output::newline();

    Ok(())
}
