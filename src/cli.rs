use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Terminal client for the project management API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all projects
    Projects,
    /// Show one project with its tasks
    ProjectShow {
        /// Project id or name
        #[arg(value_name = "PROJECT")]
        project: String,
    },
    /// Create a new project
    ProjectCreate {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
    },
    /// Replace a project's name and description
    ProjectUpdate {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(long = "name")]
        name: Option<String>,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
    },
    /// Delete a project and its tasks
    ProjectDelete {
        #[arg(value_name = "PROJECT")]
        project: String,
    },
    /// List a project's tasks with a timeline
    Tasks {
        #[arg(value_name = "PROJECT")]
        project: String,
    },
    /// Create a task in a project
    TaskCreate {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
        /// Start date, defaults to today
        #[arg(long = "start")]
        start: Option<String>,
        /// End date, defaults to a week after today
        #[arg(long = "end")]
        end: Option<String>,
        /// TODO, IN_PROGRESS or DONE
        #[arg(long = "status", default_value = "TODO")]
        status: String,
    },
    /// Replace fields of a task; dates must be YYYY-MM-DD
    TaskUpdate {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TASK_ID")]
        task_id: i64,
        #[arg(long = "title")]
        title: Option<String>,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
        #[arg(long = "start")]
        start: Option<String>,
        #[arg(long = "end")]
        end: Option<String>,
        #[arg(long = "status")]
        status: Option<String>,
    },
    /// Move a task to its next status (TODO -> IN_PROGRESS -> DONE -> TODO)
    TaskToggle {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TASK_ID")]
        task_id: i64,
    },
    /// Delete a task
    TaskDelete {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TASK_ID")]
        task_id: i64,
    },
    /// Check that the API is reachable
    Health,
    /// Launch TUI interface
    Tui,
    /// Print shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}
