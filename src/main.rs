mod api;
mod cli;
mod commands;
mod config;
mod dates;
mod form;
mod gantt;
mod logging;
mod models;
mod projects;
mod tasks;
mod ui;

use anyhow::Result;
use api::ApiClient;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use commands::{ask_user_confirmation, resolve_project, NewTask, TaskChanges};
use config::Config;
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    let tui = matches!(cli.command, None | Some(Commands::Tui));
    if tui {
        logging::init_file(&config.log_file)?;
    } else {
        logging::init_stderr()?;
    }
    let rt = tokio::runtime::Runtime::new()?;
    let api = ApiClient::new(config.api_url.clone());
    log::debug!("Using API at {}", api.base_url());

    match cli.command {
        None | Some(Commands::Tui) => {
            run_tui(&rt, api, &config.api_url)?;
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "planboard", &mut std::io::stdout());
        }
        Some(command) => rt.block_on(run_command(&api, command))?,
    }

    Ok(())
}

async fn run_command(api: &ApiClient, command: Commands) -> Result<()> {
    match command {
        Commands::Projects => commands::list_projects(api).await?,
        Commands::ProjectShow { project } => commands::show_project(api, &project).await?,
        Commands::ProjectCreate { name, description } => {
            commands::create_project(api, &name, description).await?;
        }
        Commands::ProjectUpdate { project, name, description } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                commands::update_project(api, &project, name, description).await?;
            }
        }
        Commands::ProjectDelete { project } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                commands::delete_project(api, &project).await?;
            }
        }
        Commands::Tasks { project } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                commands::list_tasks(api, &project).await?;
            }
        }
        Commands::TaskCreate { project, title, description, start, end, status } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                let new_task = NewTask { title, description, start, end, status };
                commands::create_task(api, &project, new_task).await?;
            }
        }
        Commands::TaskUpdate { project, task_id, title, description, start, end, status } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                let changes = TaskChanges { title, description, start, end, status };
                commands::update_task(api, &project, task_id, changes).await?;
            }
        }
        Commands::TaskToggle { project, task_id } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                commands::toggle_task(api, &project, task_id).await?;
            }
        }
        Commands::TaskDelete { project, task_id } => {
            if let Some(project) = resolve_project(api, &project, ask_user_confirmation).await? {
                commands::delete_task(api, &project, task_id).await?;
            }
        }
        Commands::Health => commands::health(api).await?,
        Commands::Tui | Commands::Completions { .. } => {}
    }
    Ok(())
}
