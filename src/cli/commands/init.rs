//! `sat init` command - Initialize a new SAT project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Project, ProjectError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Also initialize a git repository
    #[arg(long)]
    pub git: bool,

    /// Force initialization even if .sat/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    if args.git {
        init_git(&path)?;
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            println!(
                "{} Initialized SAT project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Create question categories",
                style("sat category new").yellow()
            );
            println!(
                "  {} Build a checklist template",
                style("sat checklist new").yellow()
            );
            println!(
                "  {} Schedule a supplier audit",
                style("sat audit new").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} SAT project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("sat init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn init_git(path: &Path) -> Result<()> {
    let git_dir = path.join(".git");
    if git_dir.exists() {
        println!(
            "{} Git repository already exists",
            style("✓").green()
        );
        return Ok(());
    }

    let output = std::process::Command::new("git")
        .arg("init")
        .current_dir(path)
        .output()
        .into_diagnostic()?;

    if output.status.success() {
        println!(
            "{} Initialized git repository",
            style("✓").green()
        );

        let gitignore_path = path.join(".gitignore");
        if !gitignore_path.exists() {
            std::fs::write(
                &gitignore_path,
                "# Editor backups\n*.swp\n*~\n",
            )
            .into_diagnostic()?;
        }
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(miette::miette!("Failed to initialize git: {}", stderr))
    }
}

fn print_structure(root: &Path) {
    let dirs = [
        ".sat/",
        ".sat/config.yaml",
        "categories/",
        "checklists/",
        "audits/",
        "findings/",
        "actions/",
    ];

    for dir in dirs {
        let full_path = root.join(dir);
        if full_path.exists() {
            println!("  {}", style(dir).dim());
        }
    }
}
