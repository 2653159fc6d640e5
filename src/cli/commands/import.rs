//! `sat import` command - Import checklist questions from CSV
//!
//! The source is parsed completely before the checklist is touched, so a
//! malformed file never leaves a partially imported template behind.

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{resolve_entity, truncate_str};
use crate::core::identity::EntityPrefix;
use crate::core::import::parse_question_source;
use crate::core::loader;
use crate::core::project::Project;
use crate::entities::category::{self, Category};
use crate::entities::checklist::{Checklist, ChecklistQuestion};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import questions from
    pub file: PathBuf,

    /// Checklist ID or short ID (@N) to append the questions to
    #[arg(long, short = 'c')]
    pub checklist: String,

    /// Validate the source without changing the checklist
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    if !args.file.exists() {
        return Err(miette::miette!("File not found: {}", args.file.display()));
    }

    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut checklist): (_, Checklist) =
        resolve_entity(&project, EntityPrefix::Chk, &args.checklist)?;

    let categories: Vec<Category> = loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;

    println!(
        "{} Importing questions from {} into {}{}",
        style("→").blue(),
        style(args.file.display()).yellow(),
        style(&checklist.name).cyan(),
        if args.dry_run {
            style(" (dry run)").dim().to_string()
        } else {
            String::new()
        }
    );
    println!();

    // Parse the whole source first; any ImportError aborts with no changes
    let rows = parse_question_source(&args.file, &categories)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut sequence = checklist
        .questions
        .iter()
        .map(|q| q.sequence)
        .max()
        .unwrap_or(0);

    let mut uncategorized = 0;
    for row in &rows {
        sequence += 10;

        let mut question = ChecklistQuestion::new(row.question.clone());
        question.evidence = row.evidence.clone();
        question.scoring_criteria = row.scoring_criteria.clone();
        question.default_score = row.score;
        question.observation = row.observation.clone();
        question.action = row.action.clone();
        question.category = row.category.clone();
        question.sequence = sequence;

        let category_name = row
            .category
            .as_ref()
            .and_then(|id| category::name_of(&categories, id))
            .unwrap_or("-");
        if row.category.is_none() {
            uncategorized += 1;
        }

        println!(
            "{} {} [{}] {}",
            if args.dry_run {
                style("○").dim()
            } else {
                style("✓").green()
            },
            truncate_str(&row.question, 48),
            row.score,
            style(category_name).dim()
        );

        if !args.dry_run {
            checklist.add_question(question);
        }
    }

    if !args.dry_run {
        loader::save_entity(&path, &checklist)?;
    }

    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Questions parsed:  {}", style(rows.len()).cyan());
    if uncategorized > 0 {
        println!(
            "  Uncategorized:     {}",
            style(uncategorized).yellow()
        );
    }
    if !args.dry_run {
        println!(
            "  Checklist total:   {}",
            style(checklist.total_questions()).green()
        );
    }

    if args.dry_run {
        println!();
        println!(
            "{}",
            style("Dry run complete. The checklist was not modified.").yellow()
        );
    }

    Ok(())
}
