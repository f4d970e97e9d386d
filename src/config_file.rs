use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

const PROJECT_CONFIG_NAME: &str = ".visittallyrc";
const APP_DIR_NAME: &str = "visit-tally";

/// Configuration file handler for visit-tally
///
/// Files are INI-like. The only recognized key is a root-level
/// `defaults = <arguments>`, whose arguments are placed before the ones
/// given on the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub defaults: Option<String>,
}

impl ConfigFile {
    /// Nearest `.visittallyrc` in the current directory or one of its ancestors.
    pub fn project_config_path() -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(PROJECT_CONFIG_NAME))
            .find(|path| path.is_file())
    }

    /// User config candidates; the first one that exists is used.
    pub fn user_config_candidates() -> Vec<PathBuf> {
        if cfg!(windows) {
            let appdata = env::var_os("APPDATA")
                .map(|dir| PathBuf::from(dir).join(APP_DIR_NAME).join("config.ini"));
            let profile =
                env::var_os("USERPROFILE").map(|dir| PathBuf::from(dir).join(PROJECT_CONFIG_NAME));
            return appdata.into_iter().chain(profile).collect();
        }

        let home = env::var_os("HOME").map(PathBuf::from);
        let config_home = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home.as_ref().map(|dir| dir.join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"));

        let mut candidates = vec![config_home.join(APP_DIR_NAME).join("config.ini")];
        candidates.extend(home.map(|dir| dir.join(PROJECT_CONFIG_NAME)));
        candidates
    }

    /// Defaults from the first user config, overridden by the project config.
    pub fn discover() -> Result<Self> {
        let user = Self::user_config_candidates()
            .into_iter()
            .find(|path| path.is_file());

        user.into_iter()
            .chain(Self::project_config_path())
            .try_fold(Self::default(), |config, path| -> Result<Self> {
                Ok(Self::merge_configs(config, Self::load_from_path(&path)?))
            })
    }

    /// An explicit `--config-file` replaces discovery.
    pub fn load(custom_path: Option<&str>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(Path::new(path)),
            None => Self::discover(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse_ini_content(&content))
    }

    fn parse_ini_content(content: &str) -> Self {
        let mut defaults = None;
        let mut current_section = String::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].to_string();
                continue;
            }

            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim();

                // Unknown keys and sections are ignored
                if current_section.is_empty() && key == "defaults" {
                    defaults = Some(value.to_string());
                }
            }
        }

        Self { defaults }
    }

    /// `overlay` wins where it sets a value.
    fn merge_configs(base: Self, overlay: Self) -> Self {
        Self {
            defaults: overlay.defaults.or(base.defaults),
        }
    }

    /// Print where defaults come from and which ones are active.
    pub fn show_config(custom_path: Option<&str>) {
        println!(
            "Configuration precedence: CLI > project {} > user config > built-in defaults\n",
            PROJECT_CONFIG_NAME
        );

        if let Some(path) = custom_path {
            println!("Using config file from --config-file: {}", path);
        }

        match Self::load(custom_path) {
            Ok(config) => match &config.defaults {
                Some(defaults) => {
                    println!("Active defaults:");
                    println!("  defaults = {}", defaults);
                }
                None => println!("No defaults configured."),
            },
            Err(e) => eprintln!("Error loading configuration: {:#}", e),
        }

        if custom_path.is_none() {
            println!("\nConfiguration search locations (in precedence order):");
            match Self::project_config_path() {
                Some(path) => println!("  1. Project: {} (found)", path.display()),
                None => println!(
                    "  1. Project: {} in current or parent directories (not found)",
                    PROJECT_CONFIG_NAME
                ),
            }
            for (rank, path) in Self::user_config_candidates().iter().enumerate() {
                let status = if path.is_file() { "found" } else { "not found" };
                println!("  {}. User: {} ({})", rank + 2, path.display(), status);
            }
        }
    }

    /// Prepend configured defaults to `args`, keeping the program name first.
    pub fn process_args(&self, args: Vec<String>) -> Result<Vec<String>> {
        let defaults = match &self.defaults {
            Some(defaults) => defaults,
            None => return Ok(args),
        };

        let default_args = shell_words::split(defaults)
            .with_context(|| "Invalid defaults: failed to parse arguments".to_string())?;

        let mut args = args.into_iter();
        let mut result = Vec::with_capacity(default_args.len() + args.len());
        result.extend(args.next()); // Keep program name
        result.extend(default_args);
        result.extend(args);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# tuned for the build host").unwrap();
        writeln!(file, "defaults = --workers 4 --threshold 5000000").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "[unused]").unwrap();
        writeln!(file, "defaults = --mode sequential").unwrap();
        file.flush().unwrap();

        let config = ConfigFile::load_from_path(file.path()).unwrap();
        assert_eq!(
            config.defaults,
            Some("--workers 4 --threshold 5000000".to_string())
        );
    }

    #[test]
    fn test_explicit_path_skips_discovery() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "defaults = --stats").unwrap();
        file.flush().unwrap();

        let config = ConfigFile::load(file.path().to_str()).unwrap();
        assert_eq!(config.defaults, Some("--stats".to_string()));
    }

    #[test]
    fn test_user_candidates_end_in_app_locations() {
        let candidates = ConfigFile::user_config_candidates();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|path| {
            path.ends_with(Path::new(APP_DIR_NAME).join("config.ini"))
                || path.ends_with(PROJECT_CONFIG_NAME)
        }));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = ConfigFile::load_from_path(Path::new("/nonexistent/visit-tally.ini")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_process_args_prepends_defaults() {
        let config = ConfigFile {
            defaults: Some("--workers 4 --output-style 'compact'".to_string()),
        };
        let args = vec![
            "visit-tally".to_string(),
            "in.csv".to_string(),
            "out.json".to_string(),
        ];
        assert_eq!(
            config.process_args(args).unwrap(),
            vec![
                "visit-tally",
                "--workers",
                "4",
                "--output-style",
                "compact",
                "in.csv",
                "out.json"
            ]
        );
    }

    #[test]
    fn test_process_args_without_defaults_is_identity() {
        let args = vec!["visit-tally".to_string(), "a".to_string()];
        assert_eq!(ConfigFile::default().process_args(args.clone()).unwrap(), args);
    }

    #[test]
    fn test_unbalanced_quotes_in_defaults_are_rejected() {
        let config = ConfigFile {
            defaults: Some("--workers '4".to_string()),
        };
        assert!(config.process_args(vec!["visit-tally".to_string()]).is_err());
    }

    #[test]
    fn test_overlay_defaults_win() {
        let base = ConfigFile {
            defaults: Some("--workers 2".to_string()),
        };
        let overlay = ConfigFile {
            defaults: Some("--workers 8".to_string()),
        };
        assert_eq!(
            ConfigFile::merge_configs(base.clone(), overlay).defaults,
            Some("--workers 8".to_string())
        );
        assert_eq!(
            ConfigFile::merge_configs(base, ConfigFile::default()).defaults,
            Some("--workers 2".to_string())
        );
    }
}
