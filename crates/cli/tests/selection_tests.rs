//! Tests for choosing a script and its argument values the way `smon` does
//! from the command line.

#[cfg(test)]
mod tests {
    use clap::Parser;
    use script_monitor_cli::arguments::{parse_named_values, should_prompt_for_arguments};
    use script_monitor_cli::cli_args::Args;
    use script_monitor_cli::script_selection::find_script;
    use script_monitor_core::catalog::{list_scripts, DISPLAY_NAMES_FILE};
    use script_monitor_core::config::Settings;
    use script_monitor_core::error::Error;
    use script_monitor_core::script_definitions::ArgumentField;
    use std::fs;
    use tempfile::TempDir;

    fn scripts_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for name in ["weather.py", "deals.py", "stock_ticker.py", "README.md"] {
            fs::write(temp_dir.path().join(name), "print('hi')\n").unwrap();
        }

        let deals_path = temp_dir.path().join("deals.py");
        fs::write(
            temp_dir.path().join(DISPLAY_NAMES_FILE),
            format!("{{\"{}\": \"Deal Finder\"}}", deals_path.display()),
        )
        .unwrap();

        temp_dir
    }

    #[test]
    fn test_select_script_from_scripts_dir_flag() {
        let temp_dir = scripts_dir();
        let args = Args::parse_from([
            "smon",
            "--scripts-dir",
            temp_dir.path().to_str().unwrap(),
            "finder",
        ]);

        let mut settings = Settings::default();
        args.apply_overrides(&mut settings);
        let scripts = list_scripts(&settings.scripts_directory()).unwrap();

        // Sorted by file name: deals, stock_ticker, weather
        assert_eq!(scripts.len(), 3);
        let index = find_script(&scripts, args.script.as_deref().unwrap()).unwrap();
        assert_eq!(scripts[index].file_name, "deals.py");
        assert_eq!(scripts[index].display_name, "Deal Finder");

        assert_eq!(find_script(&scripts, "3").unwrap(), 2);
        assert_eq!(find_script(&scripts, "stock_ticker.py").unwrap(), 1);
    }

    #[test]
    fn test_unknown_script_is_an_error() {
        let temp_dir = scripts_dir();
        let scripts = list_scripts(temp_dir.path()).unwrap();

        let result = find_script(&scripts, "nothing-like-this");
        assert!(matches!(result, Err(Error::ScriptNotFound(_))));
        assert_eq!(
            result.unwrap_err().to_string(),
            "No script matches `nothing-like-this`"
        );
    }

    #[test]
    fn test_argument_flags_cover_declared_fields() {
        let args = Args::parse_from(["smon", "deals", "-a", "query=usb c", "-a", "max=80"]);
        let fields = vec![
            ArgumentField {
                name: "query".to_string(),
                placeholder_hint: "search term".to_string(),
            },
            ArgumentField {
                name: "max".to_string(),
                placeholder_hint: String::new(),
            },
        ];

        let given = parse_named_values(&args.arguments).unwrap();
        assert_eq!(given.get("query"), Some(&"usb c".to_string()));
        assert!(!should_prompt_for_arguments(&fields, &given, args.force));

        let partial = parse_named_values(&["query=usb".to_string()]).unwrap();
        assert!(should_prompt_for_arguments(&fields, &partial, false));
        assert!(!should_prompt_for_arguments(&fields, &partial, true));
    }

    #[test]
    fn test_malformed_argument_flag() {
        let args = Args::parse_from(["smon", "deals", "-a", "query"]);
        let result = parse_named_values(&args.arguments);

        assert!(matches!(result, Err(Error::ArgumentFormat(_))));
    }
}
