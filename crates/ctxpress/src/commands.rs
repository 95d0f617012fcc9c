use crate::cli::{AdviseArgs, AdviseMode, Cli, Command, DiffArgs};
use anyhow::{Context, Result};
use ctxpress_advisor::{
    tokenizer_for, Declaration, FinalPrompt, PromptStrategyAdvisor, Tokenizer,
};
use ctxpress_core::{logging, Config};
use ctxpress_diff::{
    post_process, ChangePolicy, ChangeSource, CommitPrompt, DiffSimplifier, GitChangeSource,
    GitPatchBuilder, PathMatcher,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub fn execute(cli: Cli) -> Result<()> {
    let repo_dir = match &cli.command {
        Command::Diff(args) => args.repo.clone(),
        Command::Advise(_) => PathBuf::from("."),
    };

    let config = Config::load_layered(
        Config::get_config_dir().as_deref(),
        &repo_dir,
        cli.config.as_deref(),
    )
    .context("Failed to load configuration")?;

    let log = config.log_config();
    let level = cli.log_level.clone().unwrap_or(log.level);
    let log_file = cli.log_file.clone().or_else(|| log.file.map(PathBuf::from));
    let _guard =
        logging::init(&level, log_file.as_deref()).context("Failed to initialize logging")?;

    if let Some(warning) = config.version_warning() {
        warn!("{}", warning);
    }

    match cli.command {
        Command::Diff(args) => cmd_diff(&config, args),
        Command::Advise(args) => cmd_advise(&config, args),
    }
}

fn cmd_diff(config: &Config, args: DiffArgs) -> Result<()> {
    match diff_output(config, args, &mut io::stdin().lock())? {
        Some(text) => emit(&text),
        None => Ok(()),
    }
}

/// Text printed by `diff`, or `None` when no commit has changes to describe
fn diff_output(config: &Config, args: DiffArgs, stdin: &mut dyn Read) -> Result<Option<String>> {
    let mut diff_config = config.diff_config();
    if let Some(max_changes) = args.max_changes {
        diff_config.max_changes = max_changes;
    }
    if args.no_context {
        diff_config.include_context = false;
    }

    if args.stdin {
        let mut input = String::new();
        stdin
            .read_to_string(&mut input)
            .context("Failed to read stdin")?;
        return Ok(Some(post_process(&input)));
    }

    let mut patterns = diff_config.ignore_patterns.clone();
    patterns.extend(args.ignore);
    let ignore = PathMatcher::parse_all(&patterns)?;

    let source = GitChangeSource::open(&args.repo)
        .with_context(|| format!("Failed to open repository at {}", args.repo.display()))?
        .with_size_limit(diff_config.large_file_threshold_bytes);

    let mut builder = GitPatchBuilder::new();
    if let Some(revision) = source.head_revision() {
        builder = builder.with_revision(revision);
    }
    let simplifier = DiffSimplifier::new(builder, source.base_path())
        .with_policy(ChangePolicy::from(&diff_config));

    if args.commits.is_empty() {
        let changes = source.pending_changes()?;
        debug!(changes = changes.len(), "Collected pending changes");
        return Ok(Some(simplifier.simplify(&changes, &ignore)?));
    }

    let commits = source.commit_changes(&args.commits)?;
    match simplifier.commit_prompt(&commits, &ignore)? {
        Some(prompt) => Ok(Some(render_commit_prompt(&prompt))),
        None => {
            info!(commits = commits.len(), "No commit has changes to describe");
            Ok(None)
        }
    }
}

fn cmd_advise(config: &Config, args: AdviseArgs) -> Result<()> {
    let mut advisor_config = config.advisor_config();
    if let Some(budget) = args.budget {
        advisor_config.token_budget = budget;
    }
    if let Some(encoding) = args.encoding {
        advisor_config.encoding = encoding;
    }

    let tokenizer = tokenizer_for(&advisor_config.encoding)?;
    let advisor = PromptStrategyAdvisor::from_config(tokenizer, &advisor_config);
    let prompt = advise(&advisor, args.mode)?;

    if args.json {
        let json = serde_json::to_string_pretty(&prompt)?;
        return emit(&json);
    }

    emit(&prompt.prefix_code)?;
    if !prompt.suffix_code.is_empty() {
        emit(&prompt.suffix_code)?;
    }
    Ok(())
}

fn advise<T: Tokenizer>(advisor: &PromptStrategyAdvisor<T>, mode: AdviseMode) -> Result<FinalPrompt> {
    let prompt = match mode {
        AdviseMode::Code { file, suffix } => {
            let prefix = read_input(&file)?;
            let suffix = suffix
                .map(|path| read_input(&path))
                .transpose()?
                .unwrap_or_default();
            advisor.advise(&prefix, &suffix)
        }
        AdviseMode::File {
            file,
            declaration,
            callee,
        } => {
            let text = read_input(&file)?;
            let declaration = read_declaration(&declaration)?;
            advisor.advise_file(
                &text,
                &declaration.text,
                &declaration.summary.fields,
                &declaration.summary.methods,
                &callee,
            )
        }
        AdviseMode::Declaration {
            declaration,
            callee,
        } => {
            let declaration = read_declaration(&declaration)?;
            advisor.advise_declaration(
                &declaration.text,
                &declaration.summary.fields,
                &declaration.summary.methods,
                &callee,
            )
        }
        AdviseMode::Missing {
            file,
            declaration,
            used,
            missing,
        } => {
            let text = read_input(&file)?;
            let declaration = read_declaration(&declaration)?;
            advisor.advise_missing_methods(&text, &declaration.summary, &used, &missing)
        }
    };

    Ok(prompt)
}

/// Read a file, or stdin when the path is `-`
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read stdin")?;
        return Ok(input);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_declaration(path: &Path) -> Result<Declaration> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid declaration JSON in {}", path.display()))
}

fn render_commit_prompt(prompt: &CommitPrompt) -> String {
    format!("{}\n\n{}", prompt.summaries.join("\n"), prompt.diff)
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_text(&mut stdout, text)?;
    stdout.flush()?;
    Ok(())
}

fn write_text(out: &mut impl Write, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}
