//! `sat action` command - Corrective action management
//!
//! Every state change synchronously recomputes the linked finding's derived
//! status before the command reports success, so no stale status is ever
//! left behind.

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{escape_csv, resolve_entity, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::Priority;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::sequence::{SequenceIndex, SEQ_ACTION};
use crate::core::shortid::ShortIdIndex;
use crate::core::workflow::ValidationError;
use crate::core::Config;
use crate::entities::action::{ActionState, ActionType, CorrectiveAction};
use crate::entities::finding::Finding;

#[derive(clap::Subcommand, Debug)]
pub enum ActionCommands {
    /// List corrective actions with filtering
    List(ListArgs),

    /// Create a new corrective action
    New(NewArgs),

    /// Show an action's details
    Show(ShowArgs),

    /// Mark the action planned
    Plan(TransitionArgs),

    /// Start work on the action
    Start(TransitionArgs),

    /// Send the action for review
    Review(TransitionArgs),

    /// Complete the action (stamps the completion date)
    Complete(TransitionArgs),

    /// Cancel the action
    Cancel(TransitionArgs),

    /// Reset the action to draft
    Reset(TransitionArgs),
}

/// Action state filter
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StateFilter {
    Draft,
    Planned,
    InProgress,
    Review,
    Completed,
    Cancelled,
    Open,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by finding ID, reference, or short ID
    #[arg(long)]
    pub finding: Option<String>,

    /// Filter by workflow state ("open" = neither completed nor cancelled)
    #[arg(long, short = 's', default_value = "all")]
    pub state: StateFilter,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Action description (required)
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Assignee (required)
    #[arg(long, short = 'a')]
    pub assignee: Option<String>,

    /// Due date (YYYY-MM-DD, required)
    #[arg(long)]
    pub due: Option<String>,

    /// Related finding ID, reference, or short ID (its audit is inherited)
    #[arg(long)]
    pub finding: Option<String>,

    /// Related audit ID, reference, or short ID
    #[arg(long)]
    pub audit: Option<String>,

    /// Action type
    #[arg(long, short = 't', default_value = "corrective")]
    pub r#type: String,

    /// Priority
    #[arg(long, short = 'p', default_value = "normal")]
    pub priority: String,

    /// Planned start date (YYYY-MM-DD)
    #[arg(long)]
    pub planned: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Action ID, reference, or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct TransitionArgs {
    /// Action ID, reference, or short ID (@N)
    pub id: String,
}

pub fn run(cmd: ActionCommands) -> Result<()> {
    match cmd {
        ActionCommands::List(args) => run_list(args),
        ActionCommands::New(args) => run_new(args),
        ActionCommands::Show(args) => run_show(args),
        ActionCommands::Plan(args) => run_transition(args, Transition::Plan),
        ActionCommands::Start(args) => run_transition(args, Transition::Start),
        ActionCommands::Review(args) => run_transition(args, Transition::Review),
        ActionCommands::Complete(args) => run_transition(args, Transition::Complete),
        ActionCommands::Cancel(args) => run_transition(args, Transition::Cancel),
        ActionCommands::Reset(args) => run_transition(args, Transition::Reset),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut actions: Vec<CorrectiveAction> =
        loader::load_all(&project.entity_dir(EntityPrefix::Act))?;

    if let Some(ref finding_ref) = args.finding {
        let (_, finding): (_, Finding) = resolve_entity(&project, EntityPrefix::Fnd, finding_ref)?;
        actions.retain(|a| a.finding.as_ref() == Some(&finding.id));
    }

    actions.retain(|a| match args.state {
        StateFilter::Draft => a.state == ActionState::Draft,
        StateFilter::Planned => a.state == ActionState::Planned,
        StateFilter::InProgress => a.state == ActionState::InProgress,
        StateFilter::Review => a.state == ActionState::Review,
        StateFilter::Completed => a.state == ActionState::Completed,
        StateFilter::Cancelled => a.state == ActionState::Cancelled,
        StateFilter::Open => a.state.is_open(),
        StateFilter::All => true,
    });

    // Soonest due first
    actions.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.created.cmp(&b.created)));

    if args.count {
        println!("{}", actions.len());
        return Ok(());
    }

    if actions.is_empty() {
        println!("No corrective actions found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(actions.iter().map(|a| a.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&actions).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&actions).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,reference,type,state,priority,due,assignee,description");
            for action in &actions {
                let short_id = short_ids
                    .get_short_id(&action.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{},{},{}",
                    short_id,
                    action.reference,
                    action.action_type,
                    action.state,
                    action.priority,
                    action.due_date,
                    escape_csv(&action.assigned_to),
                    escape_csv(&action.description)
                );
            }
        }
        OutputFormat::Id => {
            for action in &actions {
                println!("{}", action.id);
            }
        }
        _ => {
            println!(
                "{:<6} {:<9} {:<12} {:<12} {:<10} {:<11} {:<26}",
                style("SHORT").bold().dim(),
                style("REF").bold(),
                style("TYPE").bold(),
                style("STATE").bold(),
                style("PRIORITY").bold(),
                style("DUE").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(90));

            for action in &actions {
                let short_id = short_ids
                    .get_short_id(&action.id.to_string())
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                let state_styled = match action.state {
                    ActionState::Completed => style(action.state.to_string()).green(),
                    ActionState::Cancelled => style(action.state.to_string()).dim(),
                    ActionState::InProgress => style(action.state.to_string()).yellow(),
                    _ => style(action.state.to_string()).white(),
                };
                let priority_styled = match action.priority {
                    Priority::Critical => style(action.priority.to_string()).red().bold(),
                    Priority::High => style(action.priority.to_string()).yellow(),
                    _ => style(action.priority.to_string()).white(),
                };

                println!(
                    "{:<6} {:<9} {:<12} {:<12} {:<10} {:<11} {:<26}",
                    style(&short_id).cyan(),
                    action.reference,
                    action.action_type.to_string(),
                    state_styled,
                    priority_styled,
                    action.due_date.to_string(),
                    truncate_str(&action.description, 24)
                );
            }

            println!();
            println!("{} action(s) found.", style(actions.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    // Description, assignee, and due date are hard requirements
    let description = args
        .description
        .ok_or_else(|| miette::miette!("{}", ValidationError::MissingField("a description")))?;
    let assignee = args
        .assignee
        .ok_or_else(|| miette::miette!("{}", ValidationError::MissingField("an assignee")))?;
    let due = args
        .due
        .ok_or_else(|| miette::miette!("{}", ValidationError::MissingField("a due date")))?;
    let due_date = parse_date(&due)?;

    let action_type: ActionType = args
        .r#type
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;
    let priority: Priority = args
        .priority
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    let mut sequences = SequenceIndex::load(&project);
    let reference = sequences.next(SEQ_ACTION);

    let mut action = CorrectiveAction::new(
        reference,
        description,
        assignee,
        due_date,
        config.author(),
    );
    action.action_type = action_type;
    action.priority = priority;
    action.planned_date = args.planned.as_deref().map(parse_date).transpose()?;

    // An action created from a finding inherits the finding's audit
    if let Some(ref finding_ref) = args.finding {
        let (finding_path, mut finding): (_, Finding) =
            resolve_entity(&project, EntityPrefix::Fnd, finding_ref)?;
        action.finding = Some(finding.id.clone());
        action.audit = Some(finding.audit.clone());

        let path = project.entity_path(EntityPrefix::Act, &action.id);
        loader::save_entity(&path, &action)?;
        sequences.save(&project).into_diagnostic()?;

        refresh_finding_status(&project, finding_path, &mut finding)?;
        announce_created(&project, &action, &path);
        return Ok(());
    }

    if let Some(ref audit_ref) = args.audit {
        let (_, audit): (_, crate::entities::audit::Audit) =
            resolve_entity(&project, EntityPrefix::Aud, audit_ref)?;
        action.audit = Some(audit.id.clone());
    }

    let path = project.entity_path(EntityPrefix::Act, &action.id);
    loader::save_entity(&path, &action)?;
    sequences.save(&project).into_diagnostic()?;

    announce_created(&project, &action, &path);
    Ok(())
}

fn announce_created(project: &Project, action: &CorrectiveAction, path: &std::path::Path) {
    let mut short_ids = ShortIdIndex::load(project);
    let short_id = short_ids.add(action.id.to_string());
    let _ = short_ids.save(project);

    println!(
        "{} Created action {} ({})",
        style("✓").green(),
        style(&action.reference).cyan(),
        style(format!("@{}", short_id)).cyan()
    );
    println!(
        "   {} | due {} | {}",
        style(action.action_type.to_string()).yellow(),
        action.due_date,
        truncate_str(&action.description, 50)
    );
    println!("   {}", style(path.display()).dim());
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _): (_, CorrectiveAction) = resolve_entity(&project, EntityPrefix::Act, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    print!("{}", content);

    Ok(())
}

enum Transition {
    Plan,
    Start,
    Review,
    Complete,
    Cancel,
    Reset,
}

fn run_transition(args: TransitionArgs, transition: Transition) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut action): (_, CorrectiveAction) =
        resolve_entity(&project, EntityPrefix::Act, &args.id)?;

    match transition {
        Transition::Plan => action.set_planned(),
        Transition::Start => action.start(),
        Transition::Review => action.review(),
        Transition::Complete => action.complete(),
        Transition::Cancel => action.cancel(),
        Transition::Reset => action.reset_to_draft(),
    }

    loader::save_entity(&path, &action)?;

    println!(
        "{} Action {} is now {}",
        style("✓").green(),
        style(&action.reference).cyan(),
        style(action.state.to_string()).white()
    );
    if action.state == ActionState::Completed {
        if let Some(date) = action.completion_date {
            println!("   completed on {}", date);
        }
    }

    // The linked finding's status is a pure function of its actions'
    // states; recompute it before reporting success.
    if let Some(finding_id) = action.finding.clone() {
        let finding_dir = project.entity_dir(EntityPrefix::Fnd);
        if let Some((finding_path, mut finding)) =
            loader::load_entity::<Finding>(&finding_dir, &finding_id.to_string())?
        {
            refresh_finding_status(&project, finding_path, &mut finding)?;
        }
    }

    Ok(())
}

/// Recompute a finding's derived status from all of its linked actions
fn refresh_finding_status(
    project: &Project,
    finding_path: std::path::PathBuf,
    finding: &mut Finding,
) -> Result<()> {
    let actions: Vec<CorrectiveAction> =
        loader::load_all(&project.entity_dir(EntityPrefix::Act))?;
    let states: Vec<ActionState> = actions
        .iter()
        .filter(|a| a.finding.as_ref() == Some(&finding.id))
        .map(|a| a.state)
        .collect();

    if finding.refresh_status(&states) {
        println!(
            "   finding {} is now {}",
            style(&finding.reference).cyan(),
            style(finding.status.to_string()).white()
        );
    }
    loader::save_entity(&finding_path, finding)?;

    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| miette::miette!("Invalid date '{}': expected YYYY-MM-DD", s))
}
