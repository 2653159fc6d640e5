//! `sat audit` command - Supplier audit management

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, resolve_entity, truncate_str};
use crate::cli::OutputFormat;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::scoring;
use crate::core::sequence::{SequenceIndex, SEQ_AUDIT};
use crate::core::shortid::ShortIdIndex;
use crate::core::workflow::ValidationError;
use crate::core::Config;
use crate::entities::action::{self, CorrectiveAction};
use crate::entities::audit::{Audit, AuditResult, AuditState, CategorySlot, FindingsStats};
use crate::entities::category::{self, Category};
use crate::entities::checklist::{Checklist, Score};
use crate::entities::finding::Finding;

#[derive(clap::Subcommand, Debug)]
pub enum AuditCommands {
    /// List audits with filtering
    List(ListArgs),

    /// Create a new audit from a checklist
    New(NewArgs),

    /// Show an audit's details
    Show(ShowArgs),

    /// Answer a question line (set its score)
    Answer(AnswerArgs),

    /// Mark a question line not applicable
    Na(NaArgs),

    /// Transition: draft -> planned
    Plan(TransitionArgs),

    /// Transition: planned -> in_progress
    Start(TransitionArgs),

    /// Complete the audit (requires all questions answered)
    Complete(TransitionArgs),

    /// Cancel the audit
    Cancel(TransitionArgs),

    /// Reset the audit to draft
    Reset(TransitionArgs),

    /// Bind or clear a category slot
    Slot(SlotArgs),

    /// Reassign lines whose category no longer matches a bound slot
    Reassign(TransitionArgs),

    /// Show computed audit statistics and per-category scores
    Stats(StatsArgs),
}

/// Audit state filter
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StateFilter {
    Draft,
    Planned,
    InProgress,
    Done,
    Cancelled,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by workflow state
    #[arg(long, short = 's', default_value = "all")]
    pub state: StateFilter,

    /// Search in reference and supplier
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Supplier under audit
    #[arg(long, short = 's')]
    pub supplier: String,

    /// Checklist ID or short ID to instantiate questions from (required)
    #[arg(long, short = 'c')]
    pub checklist: Option<String>,

    /// Lead auditor (defaults to the configured author)
    #[arg(long, short = 'a')]
    pub auditor: Option<String>,

    /// Audit team members (repeatable)
    #[arg(long = "team", short = 't')]
    pub team: Vec<String>,

    /// Scheduled start date (YYYY-MM-DD, defaults to today)
    #[arg(long, short = 'd')]
    pub date: Option<String>,

    /// Scheduled end date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Reference code (defaults to the next sequence code)
    #[arg(long)]
    pub reference: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Audit ID, reference, or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct AnswerArgs {
    /// Audit ID, reference, or short ID (@N)
    pub id: String,

    /// Question line number
    #[arg(long, short = 'l')]
    pub line: u32,

    /// Score (0-3)
    #[arg(long, short = 's')]
    pub score: String,

    /// Observation noted while answering
    #[arg(long)]
    pub observation: Option<String>,

    /// Action noted while answering
    #[arg(long)]
    pub action: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NaArgs {
    /// Audit ID, reference, or short ID (@N)
    pub id: String,

    /// Question line number
    #[arg(long, short = 'l')]
    pub line: u32,
}

#[derive(clap::Args, Debug)]
pub struct TransitionArgs {
    /// Audit ID, reference, or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SlotArgs {
    /// Audit ID, reference, or short ID (@N)
    pub id: String,

    /// Slot index (1-10)
    #[arg(long, short = 'i')]
    pub index: usize,

    /// Category name to bind
    #[arg(long, short = 'c', conflicts_with = "clear")]
    pub category: Option<String>,

    /// Clear the slot instead of binding
    #[arg(long)]
    pub clear: bool,
}

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Audit ID, reference, or short ID (@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

pub fn run(cmd: AuditCommands) -> Result<()> {
    match cmd {
        AuditCommands::List(args) => run_list(args),
        AuditCommands::New(args) => run_new(args),
        AuditCommands::Show(args) => run_show(args),
        AuditCommands::Answer(args) => run_answer(args),
        AuditCommands::Na(args) => run_na(args),
        AuditCommands::Plan(args) => run_transition(args, Transition::Plan),
        AuditCommands::Start(args) => run_transition(args, Transition::Start),
        AuditCommands::Complete(args) => run_complete(args),
        AuditCommands::Cancel(args) => run_transition(args, Transition::Cancel),
        AuditCommands::Reset(args) => run_transition(args, Transition::Reset),
        AuditCommands::Slot(args) => run_slot(args),
        AuditCommands::Reassign(args) => run_reassign(args),
        AuditCommands::Stats(args) => run_stats(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut audits: Vec<Audit> = loader::load_all(&project.entity_dir(EntityPrefix::Aud))?;

    audits.retain(|a| match args.state {
        StateFilter::Draft => a.state == AuditState::Draft,
        StateFilter::Planned => a.state == AuditState::Planned,
        StateFilter::InProgress => a.state == AuditState::InProgress,
        StateFilter::Done => a.state == AuditState::Done,
        StateFilter::Cancelled => a.state == AuditState::Cancelled,
        StateFilter::All => true,
    });

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        audits.retain(|a| {
            a.reference.to_lowercase().contains(&needle)
                || a.supplier.to_lowercase().contains(&needle)
        });
    }

    // Most recent audits first
    audits.sort_by(|a, b| b.audit_date.cmp(&a.audit_date).then(b.created.cmp(&a.created)));

    if let Some(limit) = args.limit {
        audits.truncate(limit);
    }

    if args.count {
        println!("{}", audits.len());
        return Ok(());
    }

    if audits.is_empty() {
        println!("No audits found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(audits.iter().map(|a| a.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&audits).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&audits).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,reference,supplier,date,state,progress,compliance,result");
            for audit in &audits {
                let short_id = short_ids
                    .get_short_id(&audit.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{:.1},{:.1},{}",
                    short_id,
                    audit.reference,
                    escape_csv(&audit.supplier),
                    audit.audit_date,
                    audit.state,
                    audit.completion_rate(),
                    audit.compliance_score(),
                    audit.result.map(|r| r.to_string()).unwrap_or_default()
                );
            }
        }
        OutputFormat::Id => {
            for audit in &audits {
                println!("{}", audit.id);
            }
        }
        _ => {
            println!(
                "{:<6} {:<9} {:<24} {:<11} {:<12} {:<9} {:<16}",
                style("SHORT").bold().dim(),
                style("REF").bold(),
                style("SUPPLIER").bold(),
                style("DATE").bold(),
                style("STATE").bold(),
                style("PROGRESS").bold(),
                style("RESULT").bold()
            );
            println!("{}", "-".repeat(92));

            for audit in &audits {
                let short_id = short_ids
                    .get_short_id(&audit.id.to_string())
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                let state_styled = match audit.state {
                    AuditState::Done => style(audit.state.to_string()).green(),
                    AuditState::Cancelled => style(audit.state.to_string()).dim(),
                    AuditState::InProgress => style(audit.state.to_string()).yellow(),
                    _ => style(audit.state.to_string()).white(),
                };

                println!(
                    "{:<6} {:<9} {:<24} {:<11} {:<12} {:<9} {:<16}",
                    style(&short_id).cyan(),
                    audit.reference,
                    truncate_str(&audit.supplier, 22),
                    audit.audit_date.to_string(),
                    state_styled,
                    format!("{:.0}%", audit.completion_rate()),
                    audit
                        .result
                        .map(|r| result_styled(r).to_string())
                        .unwrap_or_default()
                );
            }

            println!();
            println!("{} audit(s) found.", style(audits.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    // A checklist is a required input for audit creation
    let checklist_ref = args
        .checklist
        .ok_or_else(|| miette::miette!("{}", ValidationError::ChecklistRequired))?;
    let (_, checklist): (_, Checklist) =
        resolve_entity(&project, EntityPrefix::Chk, &checklist_ref)?;

    let audit_date = match args.date {
        Some(ref s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let end_date = args.end_date.as_deref().map(parse_date).transpose()?;

    let mut sequences = SequenceIndex::load(&project);
    let reference = match args.reference {
        Some(r) => r,
        None => sequences.next(SEQ_AUDIT),
    };

    let mut audit = Audit::new(
        reference,
        args.supplier,
        args.auditor.unwrap_or_else(|| config.author()),
        audit_date,
        end_date,
        &checklist,
        &loader::load_all::<Category>(&project.entity_dir(EntityPrefix::Cat))?,
        config.author(),
    );

    for member in args.team {
        if member != audit.auditor && !audit.team.contains(&member) {
            audit.team.push(member);
        }
    }

    let path = project.entity_path(EntityPrefix::Aud, &audit.id);
    loader::save_entity(&path, &audit)?;
    sequences.save(&project).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(audit.id.to_string());
    let _ = short_ids.save(&project);

    let bound = audit.bound_categories().len();
    println!(
        "{} Created audit {} ({}) for {}",
        style("✓").green(),
        style(&audit.reference).cyan(),
        style(format!("@{}", short_id)).cyan(),
        style(&audit.supplier).white()
    );
    println!("   {}", style(path.display()).dim());
    println!(
        "   {} question(s) from {}, {} category slot(s) bound",
        audit.total_questions(),
        style(&checklist.name).white(),
        bound
    );

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&audit).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            let content = fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
    }

    Ok(())
}

fn run_answer(args: AnswerArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    let score: Score = args
        .score
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    audit
        .set_score(args.line, score)
        .map_err(|e| miette::miette!("{}", e))?;

    if args.observation.is_some() || args.action.is_some() {
        let line = audit
            .line_mut(args.line)
            .map_err(|e| miette::miette!("{}", e))?;
        if args.observation.is_some() {
            line.observation = args.observation;
        }
        if args.action.is_some() {
            line.action = args.action;
        }
    }

    loader::save_entity(&path, &audit)?;

    println!(
        "{} Scored line {} of {} at {} ({:.0}% complete, compliance {:.1}%)",
        style("✓").green(),
        args.line,
        style(&audit.reference).cyan(),
        style(score.to_string()).white(),
        audit.completion_rate(),
        audit.compliance_score()
    );

    Ok(())
}

fn run_na(args: NaArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    audit
        .mark_not_applicable(args.line)
        .map_err(|e| miette::miette!("{}", e))?;

    loader::save_entity(&path, &audit)?;

    println!(
        "{} Marked line {} of {} not applicable",
        style("✓").green(),
        args.line,
        style(&audit.reference).cyan()
    );

    Ok(())
}

enum Transition {
    Plan,
    Start,
    Cancel,
    Reset,
}

fn run_transition(args: TransitionArgs, transition: Transition) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    let result = match transition {
        Transition::Plan => audit.plan(),
        Transition::Start => audit.start(),
        Transition::Cancel => audit.cancel(),
        Transition::Reset => audit.reset_to_draft(),
    };
    result.map_err(|e| miette::miette!("{}", e))?;

    loader::save_entity(&path, &audit)?;

    println!(
        "{} Audit {} is now {}",
        style("✓").green(),
        style(&audit.reference).cyan(),
        style(audit.state.to_string()).white()
    );

    Ok(())
}

fn run_complete(args: TransitionArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    let findings: Vec<Finding> = loader::load_all(&project.entity_dir(EntityPrefix::Fnd))?
        .into_iter()
        .filter(|f: &Finding| f.audit == audit.id)
        .collect();

    let result = audit
        .complete(&findings)
        .map_err(|e| miette::miette!("{}", e))?;

    loader::save_entity(&path, &audit)?;

    println!(
        "{} Completed audit {} - result: {}",
        style("✓").green(),
        style(&audit.reference).cyan(),
        result_styled(result)
    );
    println!(
        "   compliance {:.1}%, {} finding(s)",
        audit.compliance_score(),
        findings.len()
    );

    Ok(())
}

fn run_slot(args: SlotArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    let slot = if args.clear {
        None
    } else {
        let name = args.category.ok_or_else(|| {
            miette::miette!("Provide --category <name> to bind, or --clear to unbind")
        })?;
        let categories: Vec<Category> = loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;
        let cat = category::find_by_name(&categories, &name)
            .ok_or_else(|| miette::miette!("No category named '{}'", name))?;
        Some(CategorySlot::bind(cat))
    };

    let description = slot
        .as_ref()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "(empty)".to_string());

    audit
        .set_slot(args.index, slot)
        .map_err(|e| miette::miette!("{}", e))?;

    loader::save_entity(&path, &audit)?;

    println!(
        "{} Slot {} of {} set to {}",
        style("✓").green(),
        args.index,
        style(&audit.reference).cyan(),
        style(description).white()
    );
    println!(
        "   Line categories are untouched; run {} to realign orphans",
        style(format!("sat audit reassign {}", args.id)).yellow()
    );

    Ok(())
}

fn run_reassign(args: TransitionArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    let changed = audit.reassign_orphan_categories();
    loader::save_entity(&path, &audit)?;

    if changed == 0 {
        println!(
            "{} No orphaned lines on {}",
            style("✓").green(),
            style(&audit.reference).cyan()
        );
    } else {
        println!(
            "{} Reassigned {} line(s) on {}",
            style("✓").green(),
            changed,
            style(&audit.reference).cyan()
        );
    }

    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.id)?;

    // Warn when a bound category no longer resolves; the cached slot name
    // keeps the projection usable.
    let categories: Vec<Category> = loader::load_all(&project.entity_dir(EntityPrefix::Cat))?;
    for slot in audit.slots.iter().flatten() {
        if category::name_of(&categories, &slot.category).is_none() {
            eprintln!(
                "{} category {} no longer resolves; using cached name '{}'",
                style("warning:").yellow(),
                slot.category,
                slot.name
            );
        }
    }

    let findings: Vec<Finding> = loader::load_all(&project.entity_dir(EntityPrefix::Fnd))?
        .into_iter()
        .filter(|f: &Finding| f.audit == audit.id)
        .collect();
    let actions: Vec<CorrectiveAction> =
        loader::load_all(&project.entity_dir(EntityPrefix::Act))?
            .into_iter()
            .filter(|a: &CorrectiveAction| a.audit.as_ref() == Some(&audit.id))
            .collect();

    let stats = FindingsStats::count(&findings);
    let open = action::open_actions(&actions);
    let data = scoring::category_data(&audit);

    if args.format == OutputFormat::Json {
        let payload = serde_json::json!({
            "reference": audit.reference,
            "supplier": audit.supplier,
            "state": audit.state.to_string(),
            "result": audit.result.map(|r| r.to_string()),
            "duration_days": audit.duration(),
            "total_questions": audit.total_questions(),
            "completed_questions": audit.completed_questions(),
            "completion_rate": audit.completion_rate(),
            "compliance_score": audit.compliance_score(),
            "critical_findings": stats.critical,
            "major_findings": stats.major,
            "minor_findings": stats.minor,
            "open_actions": open,
            "categories": data,
        });
        println!("{}", serde_json::to_string_pretty(&payload).into_diagnostic()?);
        return Ok(());
    }

    println!(
        "{} {} - {}",
        style(&audit.reference).cyan().bold(),
        style(&audit.supplier).white().bold(),
        style(audit.state.to_string()).yellow()
    );
    println!(
        "  progress {:.0}% ({}/{}), compliance {:.1}%, duration {} day(s)",
        audit.completion_rate(),
        audit.completed_questions(),
        audit.total_questions(),
        audit.compliance_score(),
        audit.duration()
    );
    println!(
        "  findings: {} critical, {} major, {} minor | {} open action(s)",
        style(stats.critical).red(),
        style(stats.major).yellow(),
        stats.minor,
        open
    );
    if let Some(result) = audit.result {
        println!("  result: {}", result_styled(result));
    }

    if data.is_empty() {
        println!();
        println!("No category slots bound.");
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["#", "Category", "Questions", "Score", "Max", "%"]);
    for d in &data {
        builder.push_record([
            d.index.to_string(),
            d.name.clone(),
            d.total_questions.to_string(),
            d.total_score.to_string(),
            d.max_score.to_string(),
            format!("{:.1}", d.percentage),
        ]);
    }

    println!();
    println!("{}", builder.build().with(Style::rounded()).to_string());

    Ok(())
}

fn result_styled(result: AuditResult) -> console::StyledObject<String> {
    match result {
        AuditResult::Pass => style(result.to_string()).green(),
        AuditResult::ConditionalPass => style(result.to_string()).yellow(),
        AuditResult::Fail => style(result.to_string()).red().bold(),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| miette::miette!("Invalid date '{}': expected YYYY-MM-DD", s))
}
