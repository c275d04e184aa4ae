use clap::{Parser, Subcommand};
use lastedit::config::{RcConfig, RcLoader};
use lastedit::controller::ReopenOutcome;
use lastedit::host::{EditorHost, Notice, Notifier, TerminalHost};
use lastedit::{CursorCoordinate, FileIdentity, SessionController};
use std::error::Error;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lastedit", version, about = "Jump back to where you last edited")]
struct Cli {
    /// Directory holding the position and last-file records
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// RC file to load instead of looking up .lasteditrc
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Lines shown around the restored position
    #[arg(long, global = true, default_value_t = 3)]
    context: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record an edit in FILE at the given caret position
    Edit {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        line: u32,
        #[arg(long, default_value_t = 0)]
        character: u32,
    },
    /// Open FILE as if the editor had just started with it active
    Open { file: PathBuf },
    /// Open FROM, then switch to TO
    Switch { from: PathBuf, to: PathBuf },
    /// Open the last edited file at its last edit position
    Reopen,
    /// Show the last edited file
    Last,
    /// List every stored position
    List,
    /// Remove the stored position for FILE
    Forget { file: PathBuf },
}

fn identity_for(path: &Path) -> io::Result<FileIdentity> {
    let absolute = match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => std::path::absolute(path)?,
    };
    Ok(FileIdentity::from_path(&absolute))
}

fn load_config(cli: &Cli) -> Result<RcConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => RcLoader::load_from(path)?,
        None => RcLoader::load_config(),
    };
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Run one command against the host. Errors become error notices; the result
/// is false only when the reopen command fails.
async fn run<W: Write>(
    command: Command,
    controller: &mut SessionController,
    host: &mut TerminalHost,
    out: &mut W,
) -> bool {
    match execute(command, controller, host, out).await {
        Ok(succeeded) => succeeded,
        Err(e) => {
            log::error!("[MAIN] {e}");
            host.notify(Notice::error(e.to_string()));
            true
        }
    }
}

async fn execute<W: Write>(
    command: Command,
    controller: &mut SessionController,
    host: &mut TerminalHost,
    out: &mut W,
) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Edit {
            file,
            line,
            character,
        } => {
            let document = host.open(&identity_for(&file)?)?;
            let at = CursorCoordinate::new(line, character);
            host.set_caret(document.view, at);
            host.reveal(document.view, at);
            controller.document_changed(host).await;
            host.render(out)?;
        }
        Command::Open { file } => {
            host.open(&identity_for(&file)?)?;
            controller.startup(host).await;
            host.render(out)?;
        }
        Command::Switch { from, to } => {
            host.open(&identity_for(&from)?)?;
            controller.active_view_changed(host).await;
            host.open(&identity_for(&to)?)?;
            controller.active_view_changed(host).await;
            host.render(out)?;
        }
        Command::Reopen => match controller.reopen_last(host).await {
            ReopenOutcome::Reopened { .. } => host.render(out)?,
            ReopenOutcome::NoLastFile => {}
            ReopenOutcome::Failed { .. } => return Ok(false),
        },
        Command::Last => {
            if controller.last_file().announce(host).await.is_none() {
                writeln!(out, "{}", lastedit::controller::NO_LAST_FILE_MESSAGE)?;
            }
        }
        Command::List => {
            for (file, position) in controller.positions().all().await {
                writeln!(out, "{file}\t{}:{}", position.line, position.character)?;
            }
        }
        Command::Forget { file } => {
            let identity = identity_for(&file)?;
            if controller.positions().forget(&identity).await? {
                writeln!(out, "Forgot {identity}")?;
            } else {
                writeln!(out, "No stored position for {identity}")?;
            }
        }
    }
    Ok(true)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::debug!("[MAIN] storage dir {}", config.storage_dir().display());

    let mut controller = SessionController::from_config(&config);
    let mut host = TerminalHost::new()
        .with_context(cli.context)
        .with_color(io::stdout().is_terminal());

    let succeeded = run(cli.command, &mut controller, &mut host, &mut io::stdout()).await;

    host.write_notices(&mut io::stderr())?;
    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
