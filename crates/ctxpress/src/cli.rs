use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ctxpress", version, about = "Fit diffs and source code into LLM prompts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify configuration file path
    #[arg(long, global = true, env = "CTXPRESS_CONFIG")]
    pub config: Option<String>,

    /// Log level or filter directive (overrides config)
    #[arg(long, global = true, env = "CTXPRESS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a simplified diff of pending changes, commits or stdin
    Diff(DiffArgs),

    /// Trim source code to a token budget
    Advise(AdviseArgs),
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Repository directory (any path inside the work tree)
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Describe these commits instead of pending changes (repeatable)
    #[arg(long = "commit", value_name = "REV")]
    pub commits: Vec<String>,

    /// Extra ignore pattern, `glob:` or `regex:` prefixed (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Post-process a unified diff read from stdin
    #[arg(long, conflicts_with = "commits")]
    pub stdin: bool,

    /// Maximum number of changes to include
    #[arg(long)]
    pub max_changes: Option<usize>,

    /// Only emit changed lines, without surrounding context
    #[arg(long)]
    pub no_context: bool,
}

#[derive(Debug, Args)]
pub struct AdviseArgs {
    #[command(subcommand)]
    pub mode: AdviseMode,

    /// Token budget (overrides config)
    #[arg(long, global = true)]
    pub budget: Option<usize>,

    /// Model or encoding used to count tokens: a tiktoken name, `words` or `approx`
    #[arg(long, global = true)]
    pub encoding: Option<String>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum AdviseMode {
    /// Strip imports from a prefix when it is over budget
    Code {
        /// Prefix code file, `-` for stdin
        file: PathBuf,

        /// Suffix code file passed through unchanged
        #[arg(long)]
        suffix: Option<PathBuf>,
    },

    /// Whole file, primary declaration or the code using a dependency
    File {
        /// Source file, `-` for stdin
        file: PathBuf,

        /// JSON file with the primary declaration and its outline
        #[arg(long)]
        declaration: PathBuf,

        /// Type name of the dependency being called
        #[arg(long)]
        callee: String,
    },

    /// Narrow a declaration to the code using a dependency
    Declaration {
        /// JSON file with the declaration and its outline, `-` for stdin
        #[arg(long)]
        declaration: PathBuf,

        /// Type name of the dependency being called
        #[arg(long)]
        callee: String,
    },

    /// Prompt for the missing methods that are actually used
    Missing {
        /// Source file, `-` for stdin
        file: PathBuf,

        /// JSON file with the class outline
        #[arg(long)]
        declaration: PathBuf,

        /// Method names referenced by callers
        #[arg(long, value_delimiter = ',')]
        used: Vec<String>,

        /// Method names not yet implemented
        #[arg(long, value_delimiter = ',')]
        missing: Vec<String>,
    },
}
