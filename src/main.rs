use clap::{Parser, Subcommand};
use savepolicy::bootstrap::{self, AppContext, Bootstrap, BootstrapOptions, EnvConfig, ProcessEnv, StartupMode};
use savepolicy::layout::CandidateSaveLayout;
use savepolicy::validator::validate;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "savepolicy", version, about = "Savegame layout checks and title quirk lookup")]
struct Cli {
    /// Entry point this process runs as; decides log files and identity client
    #[arg(long, value_enum, default_value = "cli", global = true)]
    mode: StartupMode,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the quirk groups that apply to one or more titles
    Resolve {
        #[arg(required = true, num_args = 1..)]
        title_ids: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Validate an unpacked savegame directory
    Check {
        input: PathBuf,
        /// Also resolve quirks for this title
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List every quirk group and its titles
    Groups,
    /// Print the platform layout limits
    Limits,
    /// Print a starter .env file
    EnvTemplate,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Needs no configuration, so it must work before the environment exists.
    if let Commands::EnvTemplate = cli.command {
        print!("{}", EnvConfig::template());
        return Ok(ExitCode::SUCCESS);
    }

    let mut boot = Bootstrap::new();
    let ctx = boot.initialize(cli.mode, &ProcessEnv, BootstrapOptions::default())?;
    ctx.install_subscriber()?;

    let outcome = run(cli.command, &ctx);
    if let Err(e) = &outcome {
        tracing::error!(error = %e, "command failed");
    }
    outcome
}

/// Runs one command.  A rejected savegame is not an error, only a failing
/// exit code.
fn run(command: Commands, ctx: &AppContext) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {

        // ── Resolve ──────────────────────────────────────────────────────────
        Commands::Resolve { title_ids, json } => {
            let decisions: Vec<_> = title_ids.iter().map(|t| ctx.resolver.resolve(t)).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&decisions)?);
            } else {
                for d in &decisions {
                    let groups = if d.is_default() {
                        "(default handling)".to_owned()
                    } else {
                        d.groups.iter().cloned().collect::<Vec<_>>().join(", ")
                    };
                    println!("{:<10} {}", d.title_id, groups);
                }
            }
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check { input, title, json } => {
            let layout   = CandidateSaveLayout::from_dir(&input)?;
            let result   = validate(&layout, &ctx.constraints);
            let decision = title.as_deref().map(|t| ctx.resolver.resolve(t));

            if json {
                let report = serde_json::json!({
                    "path":     input.display().to_string(),
                    "passed":   result.passed(),
                    "result":   result,
                    "decision": decision,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Savegame: {}", input.display());
                println!("  Size     {}", savepolicy::size::format_megabytes(layout.declared_size));
                println!("  Members  {}", layout.members.len());
                println!("  Files    {}", layout.user_files.len());
                for v in &result.violations { println!("  FAIL     {v}"); }
                for w in &result.warnings   { println!("  WARN     {w}"); }
                if let Some(d) = &decision {
                    println!("  Quirks   {}", d.groups.iter().cloned().collect::<Vec<_>>().join(", "));
                }
                println!("{}", if result.passed() { "OK" } else { "REJECTED" });
            }
            if !result.passed() {
                return Ok(ExitCode::FAILURE);
            }
        }

        // ── Groups ───────────────────────────────────────────────────────────
        Commands::Groups => {
            for g in ctx.resolver.registry().groups() {
                let titles: Vec<&str> = g.titles.iter().map(|t| t.as_str()).collect();
                println!("{:<12} {}", g.name, titles.join(" "));
            }
        }

        // ── Limits ───────────────────────────────────────────────────────────
        Commands::Limits => {
            let c = &ctx.constraints;
            println!("── Savegame limits ({}) ─────────────────────────────", bootstrap::VERSION);
            println!("  Save size        {}..={} blocks ({} to {})",
                c.min_blocks(), c.max_blocks(), c.min_save_megabytes(), c.max_save_megabytes());
            println!("  Keystone         {} B", c.keystone_size());
            println!("  Icon             {} B max, {} px", c.icon_max_size(), c.icon_format());
            println!("  Metadata member  {} B max", c.sys_file_max());
            println!("  User files       {} max", c.max_files());
            println!("  Path / filename  {} / {} B", c.max_path_len(), c.max_filename_len());
            println!("  Mandatory        {}", c.mandatory().iter().cloned().collect::<Vec<_>>().join(", "));
        }

        Commands::EnvTemplate => print!("{}", EnvConfig::template()),
    }

    Ok(ExitCode::SUCCESS)
}
