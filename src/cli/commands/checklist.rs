//! `sat checklist` command - Checklist template management

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{escape_csv, format_short_id, resolve_entity, truncate_str};
use crate::cli::OutputFormat;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::category::{self, Category};
use crate::entities::checklist::{Checklist, ChecklistQuestion, Score};

#[derive(clap::Subcommand, Debug)]
pub enum ChecklistCommands {
    /// List checklists
    List(ListArgs),

    /// Create a new checklist template
    #[command(disable_version_flag = true)]
    New(NewArgs),

    /// Show a checklist's details
    Show(ShowArgs),

    /// Edit a checklist in your editor
    Edit(EditArgs),

    /// Add a question to a checklist
    AddQuestion(AddQuestionArgs),

    /// Remove a question from a checklist by serial number
    RemoveQuestion(RemoveQuestionArgs),

    /// Duplicate a checklist
    Copy(CopyArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include inactive checklists
    #[arg(long)]
    pub all: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Checklist name
    pub name: String,

    /// Checklist code
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Version
    #[arg(long, default_value = "1.0")]
    pub version: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Checklist ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Checklist ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AddQuestionArgs {
    /// Checklist ID or short ID (@N)
    pub checklist: String,

    /// Question text
    #[arg(long, short = 'q')]
    pub question: String,

    /// Evidence required to evaluate the question
    #[arg(long, short = 'e')]
    pub evidence: Option<String>,

    /// Scoring criteria
    #[arg(long)]
    pub criteria: Option<String>,

    /// Default score (0-3)
    #[arg(long, short = 's', default_value = "3")]
    pub score: String,

    /// Category name (defaults to "General")
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Sequence for ordering
    #[arg(long)]
    pub sequence: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveQuestionArgs {
    /// Checklist ID or short ID (@N)
    pub checklist: String,

    /// Serial number of the question to remove
    pub serial: u32,
}

#[derive(clap::Args, Debug)]
pub struct CopyArgs {
    /// Checklist ID or short ID (@N)
    pub id: String,
}

pub fn run(cmd: ChecklistCommands) -> Result<()> {
    match cmd {
        ChecklistCommands::List(args) => run_list(args),
        ChecklistCommands::New(args) => run_new(args),
        ChecklistCommands::Show(args) => run_show(args),
        ChecklistCommands::Edit(args) => run_edit(args),
        ChecklistCommands::AddQuestion(args) => run_add_question(args),
        ChecklistCommands::RemoveQuestion(args) => run_remove_question(args),
        ChecklistCommands::Copy(args) => run_copy(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut checklists: Vec<Checklist> = loader::load_all(&project.entity_dir(EntityPrefix::Chk))?;
    if !args.all {
        checklists.retain(|c| c.active);
    }
    checklists.sort_by(|a, b| a.created.cmp(&b.created));

    if checklists.is_empty() {
        println!("No checklists found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(checklists.iter().map(|c| c.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&checklists).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&checklists).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,id,name,version,active,questions");
            for checklist in &checklists {
                let short_id = short_ids
                    .get_short_id(&checklist.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    short_id,
                    checklist.id,
                    escape_csv(&checklist.name),
                    checklist.version,
                    checklist.active,
                    checklist.total_questions()
                );
            }
        }
        OutputFormat::Id => {
            for checklist in &checklists {
                println!("{}", checklist.id);
            }
        }
        _ => {
            println!(
                "{:<6} {:<17} {:<32} {:<9} {:<7} {:<9}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("VERSION").bold(),
                style("ACTIVE").bold(),
                style("QUESTIONS").bold()
            );
            println!("{}", "-".repeat(84));

            for checklist in &checklists {
                let short_id = short_ids
                    .get_short_id(&checklist.id.to_string())
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                println!(
                    "{:<6} {:<17} {:<32} {:<9} {:<7} {:<9}",
                    style(&short_id).cyan(),
                    format_short_id(&checklist.id),
                    truncate_str(&checklist.name, 30),
                    checklist.version,
                    checklist.active,
                    checklist.total_questions()
                );
            }

            println!();
            println!("{} checklist(s) found.", style(checklists.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let mut checklist = Checklist::new(args.name, config.author());
    checklist.code = args.code;
    checklist.description = args.description;
    checklist.version = args.version;

    let path = project.entity_path(EntityPrefix::Chk, &checklist.id);
    loader::save_entity(&path, &checklist)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(checklist.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created checklist {} - {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan(),
        style(&checklist.name).white()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   Add questions with {}",
        style(format!("sat checklist add-question @{} -q \"...\"", short_id)).yellow()
    );

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _): (_, Checklist) = resolve_entity(&project, EntityPrefix::Chk, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    print!("{}", content);

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (path, _): (_, Checklist) = resolve_entity(&project, EntityPrefix::Chk, &args.id)?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );

    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}

fn run_add_question(args: AddQuestionArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut checklist): (_, Checklist) =
        resolve_entity(&project, EntityPrefix::Chk, &args.checklist)?;

    let score: Score = args
        .score
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    let category_id = match args.category {
        Some(ref name) => {
            let categories: Vec<Category> =
                loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;
            let cat = category::find_by_name(&categories, name)
                .ok_or_else(|| miette::miette!("No category named '{}'", name))?;
            cat.id.clone()
        }
        None => find_or_create_general(&project)?,
    };

    let mut question = ChecklistQuestion::new(args.question.clone());
    question.evidence = args.evidence;
    question.scoring_criteria = args.criteria;
    question.default_score = score;
    question.category = Some(category_id);
    question.sequence = args
        .sequence
        .unwrap_or_else(|| next_sequence(&checklist));

    checklist.add_question(question);
    loader::save_entity(&path, &checklist)?;

    println!(
        "{} Added question {} to {} ({} total)",
        style("✓").green(),
        style(truncate_str(&args.question, 40)).white(),
        style(&checklist.name).cyan(),
        checklist.total_questions()
    );

    Ok(())
}

fn run_remove_question(args: RemoveQuestionArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut checklist): (_, Checklist) =
        resolve_entity(&project, EntityPrefix::Chk, &args.checklist)?;

    if !checklist.remove_question(args.serial) {
        return Err(miette::miette!(
            "No question with serial {} on checklist '{}'",
            args.serial,
            checklist.name
        ));
    }

    loader::save_entity(&path, &checklist)?;

    println!(
        "{} Removed question {} from {} ({} remaining)",
        style("✓").green(),
        args.serial,
        style(&checklist.name).cyan(),
        checklist.total_questions()
    );

    Ok(())
}

fn run_copy(args: CopyArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (_, checklist): (_, Checklist) = resolve_entity(&project, EntityPrefix::Chk, &args.id)?;

    let copy = checklist.duplicate(config.author());
    let path = project.entity_path(EntityPrefix::Chk, &copy.id);
    loader::save_entity(&path, &copy)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(copy.id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Copied checklist to {} - {}",
        style("✓").green(),
        style(format!("@{}", short_id)).cyan(),
        style(&copy.name).white()
    );

    Ok(())
}

/// Next sequence slot for an appended question (steps of 10)
fn next_sequence(checklist: &Checklist) -> u32 {
    checklist
        .questions
        .iter()
        .map(|q| q.sequence)
        .max()
        .unwrap_or(0)
        + 10
}

/// Find the "General" category, creating it when missing
fn find_or_create_general(project: &Project) -> Result<crate::core::EntityId> {
    let categories: Vec<Category> = loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;
    if let Some(general) = category::find_by_name(&categories, "General") {
        return Ok(general.id.clone());
    }

    let config = Config::load();
    let general = Category::new("General".to_string(), config.author());
    let path = project.entity_path(EntityPrefix::Cat, &general.id);
    loader::save_entity(&path, &general)?;

    println!(
        "{} Created default category {}",
        style("✓").green(),
        style("General").white()
    );

    Ok(general.id)
}
