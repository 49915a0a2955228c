mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::daemon::{run_daemon_process, show_status, start_daemon, stop_daemon};
use focusflow_core::config::get_data_dir;
use focusflow_storage::{SiteType, UiTheme};

#[derive(Parser)]
#[command(name = "focusflow")]
#[command(about = "Block distracting websites during focus sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize focusflow (first-time setup)
    Init,
    /// Start the blocking daemon
    Start,
    /// (Internal) Run the daemon process
    #[command(hide = true)]
    DaemonInternalStart,
    /// Stop the blocking daemon
    Stop,
    /// Show daemon and session status
    Status,
    /// Start or stop a focus session
    Focus {
        #[command(subcommand)]
        action: FocusAction,
    },
    /// Manage the block list
    Sites {
        #[command(subcommand)]
        action: SitesAction,
    },
    /// Show or change preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Show the page a blocked navigation was redirected to
    Blocked {
        /// Blocked page URL, e.g. focusflow://blocked?domain=reddit.com
        url: String,
    },
}

#[derive(Subcommand, Debug)]
enum FocusAction {
    /// Start a focus session
    Start {
        /// Session length in minutes
        #[arg(short, long, conflicts_with = "preset")]
        minutes: Option<u32>,
        /// Use the Nth duration preset (1-based)
        #[arg(short, long)]
        preset: Option<usize>,
    },
    /// End the current session early
    Stop,
}

#[derive(Subcommand, Debug)]
enum SitesAction {
    /// List blocked sites
    List,
    /// Add a site to the block list
    Add {
        /// Domain or URL, e.g. reddit.com
        domain: String,
        /// focus (blocked during sessions) or permanent (always blocked)
        #[arg(short = 't', long = "type", default_value = "focus")]
        site_type: SiteType,
    },
    /// Remove a site from the block list
    Remove { domain: String },
    /// Change when a site is blocked
    SetType {
        domain: String,
        /// focus or permanent
        site_type: SiteType,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Show current preferences
    Show,
    /// Set the UI theme (light, dark, system)
    Theme { theme: UiTheme },
    /// Replace the session duration presets, in minutes
    Presets {
        #[arg(required = true)]
        minutes: Vec<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::DaemonInternalStart) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .init();
    }

    let data_dir = get_data_dir()?;

    match cli.command {
        Commands::Init => commands::init::init_command(&data_dir),
        Commands::Start => start_daemon(&data_dir),
        Commands::DaemonInternalStart => run_daemon_process().await,
        Commands::Stop => stop_daemon(&data_dir).await,
        Commands::Status => show_status(&data_dir).await,
        Commands::Focus { action } => match action {
            FocusAction::Start { minutes, preset } => {
                commands::focus::start_focus(&data_dir, minutes, preset).await
            }
            FocusAction::Stop => commands::focus::stop_focus(&data_dir).await,
        },
        Commands::Sites { action } => match action {
            SitesAction::List => commands::sites::list_sites(),
            SitesAction::Add { domain, site_type } => {
                commands::sites::add_site(&data_dir, &domain, site_type).await
            }
            SitesAction::Remove { domain } => {
                commands::sites::remove_site(&data_dir, &domain).await
            }
            SitesAction::SetType { domain, site_type } => {
                commands::sites::set_site_type(&data_dir, &domain, site_type).await
            }
        },
        Commands::Prefs { action } => match action {
            PrefsAction::Show => commands::prefs::show_prefs(),
            PrefsAction::Theme { theme } => commands::prefs::set_theme(theme),
            PrefsAction::Presets { minutes } => commands::prefs::set_presets(minutes),
        },
        Commands::Blocked { url } => commands::blocked::show_blocked(&url),
    }
}
