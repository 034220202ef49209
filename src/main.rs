use clap::Parser;
use garde::cli::errors::print_error_with_json;
use garde::cli::render;
use garde::cli::tracing_init::init_tracing;
use garde::cli::{Cli, Commands, SessionCommands};
use garde::config::Config;
use garde::error::Error;
use garde::interactive;
use garde::model::{BatchOperation, IngredientRef};
use garde::orchestrator::{Orchestrator, ResumeOutcome};
use garde::remote::HttpRemoteClient;
use garde::session::{JsonSessionStore, SessionStore};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_errors = cli.json_errors;

    if let Err(e) = run(cli).await {
        print_error_with_json(&e, json_errors);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = Config::from_env()?;
    let store = JsonSessionStore::new(config.session_path.clone());

    match cli.command {
        Commands::Session(SessionCommands::Discard) => {
            store.discard().await?;
            render::info("Session discarded.");
            return Ok(());
        }
        Commands::Session(SessionCommands::Show) => {
            return show_session(&store).await;
        }
        Commands::Run => {}
    }

    let remote = Arc::new(HttpRemoteClient::new(&config)?);
    let (mut orchestrator, outcome) = Orchestrator::bootstrap(remote, store, &config).await?;

    match outcome {
        ResumeOutcome::StartedFresh => render::info("Starting a fresh session."),
        ResumeOutcome::Resumed => render::info("Resumed existing session."),
        ResumeOutcome::RecoveredFrom(failure) => {
            render::info(format!(
                "Previous session could not be used ({failure:?}); starting fresh."
            ));
        }
    }

    run_interactive_loop(&mut orchestrator, cli.dry_run).await
}

async fn show_session(store: &JsonSessionStore) -> Result<(), Error> {
    use garde::session::LoadOutcome;
    match store.load().await {
        LoadOutcome::Present(state) => {
            render::info(format!(
                "patterns completed: {}\npatterns skipped: {}\nunits created: {}\nfoods created: {}\naliases added: {}\ningredients updated: {}",
                state.stats.patterns_completed,
                state.stats.patterns_skipped,
                state.stats.units_created,
                state.stats.foods_created,
                state.stats.aliases_added,
                state.stats.ingredients_updated,
            ));
        }
        LoadOutcome::Absent(_) => render::info("No session on record."),
    }
    Ok(())
}

async fn run_interactive_loop<R, S>(
    orchestrator: &mut Orchestrator<R, S>,
    dry_run: bool,
) -> Result<(), Error>
where
    R: garde::remote::RemoteClient + 'static,
    S: SessionStore,
{
    loop {
        let pending: Vec<String> = orchestrator
            .pending_patterns()
            .into_iter()
            .map(|p| p.id.clone())
            .collect();

        if pending.is_empty() {
            render::info("No pending patterns remain.");
            break;
        }

        let groups: Vec<_> = pending
            .iter()
            .filter_map(|id| orchestrator.pattern(id))
            .collect();
        render::info(render::render_pattern_table(&groups));

        let options: Vec<(String, String)> = groups
            .iter()
            .map(|g| (g.id.clone(), g.display_text.clone()))
            .collect();

        let selection = match interactive::select_from_options("Select a pattern to resolve (empty to quit):", &options) {
            Ok(id) => id,
            Err(e) if e.kind() == Some(garde::error::ErrorKind::Interactive) => break,
            Err(e) => return Err(e),
        };

        if dry_run {
            render::info(format!("[dry run] would resolve pattern {selection}"));
            continue;
        }

        let should_skip = !interactive::confirm("Resolve this pattern now? (no = skip)")?;
        if should_skip {
            orchestrator.skip(&selection).await?;
            continue;
        }

        let Some(group) = orchestrator.pattern(&selection) else {
            continue;
        };
        let affected: Vec<IngredientRef> = group.ingredient_refs.clone();
        let kind = group.kind;
        let display_text = group.display_text.clone();

        let op = match kind {
            garde::model::PatternKind::Unit => {
                let name = interactive::prompt_for_input(&format!(
                    "Enter the canonical unit name to use for '{display_text}': "
                ))?;
                BatchOperation::CreateUnit {
                    pattern_id: selection.clone(),
                    name,
                    abbreviation: None,
                    description: None,
                    affected,
                }
            }
            garde::model::PatternKind::Food => {
                let attach_existing = interactive::confirm(
                    "Attach this pattern as an alias of an existing food instead of creating a new one?",
                )?;
                if attach_existing {
                    let target = interactive::prompt_for_input(
                        "Enter the existing food's name or id to attach the alias to: ",
                    )?;
                    let target_entity_id = orchestrator
                        .catalog()
                        .foods
                        .iter()
                        .find(|f| f.id == target || f.name.eq_ignore_ascii_case(&target))
                        .map(|f| f.id.clone())
                        .ok_or_else(|| {
                            Error::validation_error(format!("no existing food matches '{target}'"))
                        })?;
                    BatchOperation::AddFoodAlias {
                        pattern_id: selection.clone(),
                        target_entity_id,
                        alias_text: display_text.clone(),
                        affected,
                    }
                } else {
                    let name = interactive::prompt_for_input(&format!(
                        "Enter the canonical food name to use for '{display_text}': "
                    ))?;
                    BatchOperation::CreateFood {
                        pattern_id: selection.clone(),
                        name,
                        description: None,
                        affected,
                    }
                }
            }
        };

        let result = orchestrator.run_batch(op).await?;
        render::info(render::render_batch_result(&result));
    }

    orchestrator.finalize().await
}
