use std::process::ExitCode;

use clap::Parser;
use indexmap::IndexMap;
use log::{debug, info};
use script_monitor_core::catalog;
use script_monitor_core::config::{self, Settings};
use script_monitor_core::controller::SessionController;
use script_monitor_core::error::Error::{EmptyCatalog, ScriptNotFound};
use script_monitor_core::error::Result;
use script_monitor_core::script_definitions::ScriptDescriptor;

use script_monitor_cli::arguments::{parse_named_values, should_prompt_for_arguments};
use script_monitor_cli::bell::TerminalBell;
use script_monitor_cli::cli_args::Args;
use script_monitor_cli::output::{print_preview_summary, print_script_list, Printer};
use script_monitor_cli::script_selection::{
    confirm_run, fill_argument_values, find_script, prompt_for_script_choice, RunChoice,
    ScriptChoice,
};
use script_monitor_cli::session;

/// Load settings and the script catalog
fn initialize(args: &Args) -> Result<(Settings, Vec<ScriptDescriptor>)> {
    let config_path = config::get_config_path(&args.config_path);
    debug!("Config path: `{}`", config_path);

    let mut settings = config::load_settings(&config_path)?;
    args.apply_overrides(&mut settings);

    let directory = settings.scripts_directory();
    catalog::ensure_scripts_directory(&directory)?;
    let scripts = catalog::list_scripts(&directory)?;

    if scripts.is_empty() {
        return Err(EmptyCatalog(directory.display().to_string()));
    }

    Ok((settings, scripts))
}

fn get_selected_script(args: &Args, scripts: &[ScriptDescriptor]) -> Result<ScriptChoice> {
    match &args.script {
        Some(query) => Ok(ScriptChoice::Index(find_script(scripts, query)?)),
        None => prompt_for_script_choice(scripts),
    }
}

/// Hand argument values to the controller, prompting where needed. Returns
/// whether the run should go ahead.
fn confirm_argument_values(args: &Args, controller: &mut SessionController) -> Result<bool> {
    let fields = controller.fields().to_vec();
    let given = parse_named_values(&args.arguments)?;
    let mut values: IndexMap<String, String> = given.clone();
    let mut need_to_prompt = should_prompt_for_arguments(&fields, &given, args.force);

    loop {
        if need_to_prompt {
            values = fill_argument_values(&fields, &values)?;
        }

        for (name, value) in &values {
            controller.set_argument_value(name, value.clone())?;
        }

        if args.force {
            return Ok(true);
        }

        match confirm_run(!fields.is_empty())? {
            RunChoice::Yes => return Ok(true),
            RunChoice::No => return Ok(false),
            RunChoice::ChangeArguments => need_to_prompt = true,
        }
    }
}

async fn execute() -> Result<()> {
    let args = Args::parse();
    let (settings, scripts) = initialize(&args)?;

    if args.list {
        print_script_list(&scripts);
        return Ok(());
    }

    let index = match get_selected_script(&args, &scripts)? {
        ScriptChoice::Index(index) => index,
        ScriptChoice::Quit => return Ok(()),
    };
    let script = scripts
        .get(index)
        .cloned()
        .ok_or_else(|| ScriptNotFound((index + 1).to_string()))?;

    let printer = Printer::new(args.open_urls);
    let mut controller = SessionController::new(settings, TerminalBell::new(!args.quiet));

    controller.select_script(script).await?;
    session::drive(&mut controller, &printer).await?;
    print_preview_summary(&controller)?;

    if args.preview_only {
        return Ok(());
    }

    if !confirm_argument_values(&args, &mut controller)? {
        info!("Run cancelled by user");
        return Ok(());
    }

    controller.run().await?;
    session::drive(&mut controller, &printer).await
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
