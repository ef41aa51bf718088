use clap::Args;
use common::config::components::job::DEFAULT_APP_NAME;
use common::config::components::source::{DEFAULT_SOURCE_TABLE, DEFAULT_STATEMENT_COLUMN};
use common::config::CONFIG_FILE_NAME;
use common::error::VmatError;
use minijinja::{context, Environment};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const JOB_TEMPLATE: &str = include_str!("templates/view-materializer.yml.j2");
const CONNECTIONS_FILE_NAME: &str = "connections.yml";
const CONNECTIONS_TEMPLATE: &str = include_str!("templates/connections.yml.j2");

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(
        long = "path",
        short = 'p',
        default_value = ".",
        help = "directory to write the config into"
    )]
    pub(crate) path: PathBuf,
    #[arg(long = "app-name", default_value = DEFAULT_APP_NAME, help = "job name reported to the engine")]
    pub(crate) app_name: String,
    #[arg(long = "profile-name", default_value = "dev", help = "connection profile to create")]
    pub(crate) profile_name: String,
}

/// Write `view-materializer.yml` and `connections.yml`, refusing to overwrite.
pub fn handle_init(args: &InitArgs) -> Result<(), VmatError> {
    let files = [
        (CONFIG_FILE_NAME, JOB_TEMPLATE),
        (CONNECTIONS_FILE_NAME, CONNECTIONS_TEMPLATE),
    ];
    for (name, _) in &files {
        let target = args.path.join(name);
        if target.exists() {
            return Err(VmatError::init_msg(format!(
                "{} already exists",
                target.display()
            )));
        }
    }

    fs::create_dir_all(&args.path).map_err(VmatError::init)?;
    let mut env = Environment::new();
    let ctx = context! {
        app_name => &args.app_name,
        profile => &args.profile_name,
        source_table => DEFAULT_SOURCE_TABLE,
        source_column => DEFAULT_STATEMENT_COLUMN,
    };
    for (name, template) in files {
        render_to(&mut env, &args.path, name, template, &ctx)?;
    }

    info!("wrote starter config to {}", args.path.display());
    Ok(())
}

fn render_to(
    env: &mut Environment<'static>,
    dir: &Path,
    name: &'static str,
    template: &'static str,
    ctx: &minijinja::Value,
) -> Result<(), VmatError> {
    env.add_template(name, template).map_err(VmatError::init)?;
    let rendered = env
        .get_template(name)
        .and_then(|t| t.render(ctx))
        .map_err(VmatError::init)?;
    fs::write(dir.join(name), rendered).map_err(VmatError::init)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::read_config;

    fn args(path: &Path) -> InitArgs {
        InitArgs {
            path: path.to_path_buf(),
            app_name: DEFAULT_APP_NAME.to_string(),
            profile_name: "dev".to_string(),
        }
    }

    #[test]
    fn generated_files_load_as_config() {
        let dir = tempfile::tempdir().unwrap();
        handle_init(&args(dir.path())).unwrap();

        let config = read_config(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.source.table, DEFAULT_SOURCE_TABLE);
        assert_eq!(config.source.column, DEFAULT_STATEMENT_COLUMN);
        assert_eq!(config.connection.port, "5432");
    }

    #[test]
    fn custom_profile_name_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut init = args(dir.path());
        init.profile_name = "warehouse_prod".to_string();
        handle_init(&init).unwrap();

        let raw = fs::read_to_string(dir.path().join(CONNECTIONS_FILE_NAME)).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
        assert!(parsed.get("warehouse_prod").is_some());
    }

    #[test]
    fn names_with_yaml_syntax_load_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut init = args(dir.path());
        init.app_name = "nightly: views #1".to_string();
        init.profile_name = "dev: eu #2".to_string();
        handle_init(&init).unwrap();

        let config = read_config(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.app_name, "nightly: views #1");
        assert_eq!(config.connection.host, "localhost");

        let overridden = read_config(Some(dir.path().to_path_buf()), Some("dev: eu #2")).unwrap();
        assert_eq!(overridden.app_name, "nightly: views #1");
    }

    #[test]
    fn existing_config_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "keep me").unwrap();

        let err = handle_init(&args(dir.path())).unwrap_err();
        assert!(matches!(err, VmatError::Init { .. }));
        let kept = fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(kept, "keep me");
    }
}
