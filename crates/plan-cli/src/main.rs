use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use plan_core::prelude::*;
use plan_model::Fingerprint;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod render;

/// Generator that answers every instruction with a fixed patch document
struct ReplayGenerator {
    patch: Value,
}

#[async_trait::async_trait]
impl ProposalGenerator for ReplayGenerator {
    async fn generate(
        &self,
        instruction: &str,
        snapshot: Arc<ProjectState>,
    ) -> Result<Value, GenerationError> {
        tracing::debug!(instruction, records = snapshot.record_count(), "replaying patch file");
        Ok(self.patch.clone())
    }
}

fn cli() -> Command {
    Command::new("planstage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Diff and stage project proposals")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("diff")
                .about("Compare two project documents")
                .arg(
                    Arg::new("base")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Baseline project JSON"),
                )
                .arg(
                    Arg::new("candidate")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Candidate project JSON"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the full report as JSON"),
                ),
        )
        .subcommand(
            Command::new("stage")
                .about("Stage a patch file as a proposal against a stored project")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of <project-id>.json documents"),
                )
                .arg(Arg::new("project-id").required(true).help("Project to open"))
                .arg(
                    Arg::new("patch")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Patch JSON keyed by slot name"),
                )
                .arg(
                    Arg::new("instruction")
                        .long("instruction")
                        .default_value("apply patch file")
                        .help("Description recorded with the proposal"),
                )
                .arg(
                    Arg::new("commit")
                        .long("commit")
                        .action(ArgAction::SetTrue)
                        .help("Commit and persist instead of discarding"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Session configuration (TOML)"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_state(path: &Path) -> Result<ProjectState> {
    let value = read_json(path)?;
    ProjectState::from_value(&value)
        .with_context(|| format!("{} is not a project document", path.display()))
}

fn short(fingerprint: Result<Fingerprint, plan_model::ModelError>) -> String {
    fingerprint.map_or_else(|_| "?".to_string(), |f| f.short())
}

fn run_diff(args: &ArgMatches) -> Result<()> {
    let base_path = args.get_one::<PathBuf>("base").context("missing <base>")?;
    let candidate_path = args.get_one::<PathBuf>("candidate").context("missing <candidate>")?;
    let base = read_state(base_path)?;
    let candidate = read_state(candidate_path)?;

    let report = plan_diff::diff_states(&base, &candidate);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "base {}  candidate {}",
            short(base.fingerprint()),
            short(candidate.fingerprint())
        );
        print!("{}", render::render_report(&report));
    }
    Ok(())
}

async fn run_stage(args: &ArgMatches, config: SessionConfig) -> Result<()> {
    let dir = args.get_one::<PathBuf>("dir").context("missing <dir>")?;
    let project_id = args.get_one::<String>("project-id").context("missing <project-id>")?;
    let patch_path = args.get_one::<PathBuf>("patch").context("missing <patch>")?;
    let instruction = args
        .get_one::<String>("instruction")
        .map_or("apply patch file", String::as_str);

    let generator = Arc::new(ReplayGenerator {
        patch: read_json(patch_path)?,
    });
    let repository = Arc::new(JsonFileRepository::new(dir));
    let session = ProjectSession::open(project_id.as_str(), generator, repository, config).await?;

    let outcome = session.propose(instruction).await?;
    if !outcome.is_staged() {
        anyhow::bail!("proposal was superseded");
    }
    print!("{}", render::render_report(&session.diff()));

    if args.get_flag("commit") {
        let receipt = session.commit().await?;
        println!(
            "committed {} ({} changes)",
            receipt.proposal_id,
            receipt.summary.total()
        );
    } else {
        let id = session.discard()?;
        println!("discarded {id} (use --commit to keep it)");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = match matches
        .subcommand_matches("stage")
        .and_then(|args| args.get_one::<PathBuf>("config"))
    {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    init_tracing(config.json_logs);

    match matches.subcommand() {
        Some(("diff", args)) => run_diff(args),
        Some(("stage", args)) => run_stage(args, config).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn parses_stage_arguments() {
        let matches = cli()
            .try_get_matches_from([
                "planstage", "stage", "data", "p1", "patch.json", "--commit", "--instruction", "add tags",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "stage");
        assert!(args.get_flag("commit"));
        assert_eq!(args.get_one::<String>("instruction").unwrap(), "add tags");
        assert_eq!(args.get_one::<String>("project-id").unwrap(), "p1");
    }

    #[tokio::test]
    async fn stage_commit_persists_patch() {
        let dir = tempfile::tempdir().unwrap();
        let repository = JsonFileRepository::new(dir.path());
        repository
            .save("p1", &ProjectState::new(plan_model::ProjectRecord::new("p1", "Acme")))
            .await
            .unwrap();
        let patch_path = dir.path().join("patch.json");
        std::fs::write(&patch_path, r#"{"tags": [{"id": "t1", "label": "b2b"}]}"#).unwrap();

        let dir_arg = dir.path().to_string_lossy().into_owned();
        let patch_arg = patch_path.to_string_lossy().into_owned();
        let matches = cli()
            .try_get_matches_from(["planstage", "stage", &dir_arg, "p1", &patch_arg, "--commit"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        run_stage(args, SessionConfig::default()).await.unwrap();

        let saved = repository.load("p1").await.unwrap();
        assert!(saved.collection(Slot::Tags).contains("t1"));
    }
}
