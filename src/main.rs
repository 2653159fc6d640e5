use clap::Parser;
use miette::Result;
use sat::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => sat::cli::commands::init::run(args),
        Commands::Category(cmd) => sat::cli::commands::category::run(cmd),
        Commands::Checklist(cmd) => sat::cli::commands::checklist::run(cmd),
        Commands::Audit(cmd) => sat::cli::commands::audit::run(cmd),
        Commands::Finding(cmd) => sat::cli::commands::finding::run(cmd),
        Commands::Action(cmd) => sat::cli::commands::action::run(cmd),
        Commands::Import(args) => sat::cli::commands::import::run(args),
        Commands::Completions(args) => sat::cli::commands::completions::run(args),
    }
}
