//! `sat category` command - Question category management

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{escape_csv, format_short_id, resolve_entity, truncate_str};
use crate::cli::OutputFormat;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::workflow::ValidationError;
use crate::entities::audit::Audit;
use crate::entities::category::Category;
use crate::entities::checklist::Checklist;
use crate::entities::finding::Finding;

#[derive(clap::Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    List(ListArgs),

    /// Create a new category
    New(NewArgs),

    /// Show a category's details
    Show(ShowArgs),

    /// Delete a category (fails while referenced)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Category name
    pub name: String,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Display sequence
    #[arg(long, short = 's', default_value = "10")]
    pub sequence: u32,

    /// Color index for charts
    #[arg(long, short = 'c', default_value = "0")]
    pub color: u32,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Category ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Category ID or short ID (@N)
    pub id: String,
}

pub fn run(cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::List(args) => run_list(args),
        CategoryCommands::New(args) => run_new(args),
        CategoryCommands::Show(args) => run_show(args),
        CategoryCommands::Delete(args) => run_delete(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut categories: Vec<Category> = loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;
    categories.sort_by(|a, b| a.sequence.cmp(&b.sequence).then(a.name.cmp(&b.name)));

    if categories.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(categories.iter().map(|c| c.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&categories).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&categories).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,name,sequence,color");
            for cat in &categories {
                let short_id = short_ids
                    .get_short_id(&cat.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{}",
                    short_id,
                    cat.id,
                    escape_csv(&cat.name),
                    cat.sequence,
                    cat.color
                );
            }
        }
        OutputFormat::Id => {
            for cat in &categories {
                println!("{}", cat.id);
            }
        }
        _ => {
            println!(
                "{:<6} {:<17} {:<32} {:<5}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("SEQ").bold()
            );
            println!("{}", "-".repeat(62));

            for cat in &categories {
                let short_id = short_ids
                    .get_short_id(&cat.id.to_string())
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                println!(
                    "{:<6} {:<17} {:<32} {:<5}",
                    style(&short_id).cyan(),
                    format_short_id(&cat.id),
                    truncate_str(&cat.name, 30),
                    cat.sequence
                );
            }

            println!();
            println!("{} categorie(s) found.", style(categories.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = crate::core::Config::load();

    let existing: Vec<Category> = loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;
    if let Some(dup) = existing.iter().find(|c| c.matches_name(&args.name)) {
        return Err(miette::miette!(
            "Category '{}' already exists as '{}'",
            args.name,
            dup.name
        ));
    }

    let mut category = Category::new(args.name, config.author());
    category.description = args.description;
    category.sequence = args.sequence;
    category.color = args.color;

    let path = project.entity_path(EntityPrefix::Cat, &category.id);
    loader::save_entity(&path, &category)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(category.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created category {} - {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan(),
        style(&category.name).white()
    );
    println!("   {}", style(path.display()).dim());

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _): (_, Category) = resolve_entity(&project, EntityPrefix::Cat, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    print!("{}", content);

    Ok(())
}

fn run_delete(args: DeleteArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, category): (_, Category) = resolve_entity(&project, EntityPrefix::Cat, &args.id)?;

    let count = count_references(&project, &category)?;
    if count > 0 {
        return Err(miette::miette!(
            "{}",
            ValidationError::CategoryInUse {
                name: category.name.clone(),
                count,
            }
        ));
    }

    fs::remove_file(&path).into_diagnostic()?;
    println!(
        "{} Deleted category {}",
        style("✓").green(),
        style(&category.name).white()
    );

    Ok(())
}

/// Count references to a category across checklists, audits, and findings
fn count_references(project: &Project, category: &Category) -> Result<usize> {
    let mut count = 0;

    let checklists: Vec<Checklist> = loader::load_all(&project.entity_dir(EntityPrefix::Chk))?;
    for checklist in &checklists {
        count += checklist
            .questions
            .iter()
            .filter(|q| q.category.as_ref() == Some(&category.id))
            .count();
    }

    let audits: Vec<Audit> = loader::load_all(&project.entity_dir(EntityPrefix::Aud))?;
    for audit in &audits {
        count += audit
            .slots
            .iter()
            .flatten()
            .filter(|s| s.category == category.id)
            .count();
        count += audit
            .lines
            .iter()
            .filter(|l| l.category.as_ref() == Some(&category.id))
            .count();
    }

    let findings: Vec<Finding> = loader::load_all(&project.entity_dir(EntityPrefix::Fnd))?;
    count += findings
        .iter()
        .filter(|f| f.category.as_ref() == Some(&category.id))
        .count();

    Ok(count)
}
