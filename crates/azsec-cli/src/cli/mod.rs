use std::path::PathBuf;
use std::process;

use azsec_core::Severity;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use hiro_system_kit::{self, Logger};

pub mod lint;

use lint::LintOutcome;

#[derive(Clone)]
pub struct Context {
    pub logger: Option<Logger>,
}

impl Context {
    pub fn try_log<F>(&self, closure: F)
    where
        F: FnOnce(&Logger),
    {
        if let Some(ref logger) = self.logger {
            closure(logger)
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Security linter for azurerm Terraform configurations", long_about = None)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Lint the Terraform files of a directory
    #[clap(name = "lint", bin_name = "lint")]
    Lint(LintCommand),
    /// List available rules and their defaults
    #[clap(name = "rules", bin_name = "rules")]
    Rules(ListRules),
    /// Write a default .azsec.yml to the current directory
    #[clap(name = "init", bin_name = "init")]
    Init(InitConfig),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LintOutputFormat {
    Stylish,
    Compact,
    Json,
    Quickfix,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct LintCommand {
    /// Directory holding the .tf files to lint
    #[arg(default_value = ".")]
    pub directory: PathBuf,
    /// Output format
    #[arg(long = "format", short = 'f', value_enum, default_value_t = LintOutputFormat::Stylish)]
    pub format: LintOutputFormat,
    /// Path to the configuration file (defaults to .azsec.yml in the current directory)
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<PathBuf>,
    /// Enable a rule, may be repeated
    #[arg(long = "enable-rule", value_name = "NAME")]
    pub enabled_rules: Vec<String>,
    /// Disable a rule, may be repeated
    #[arg(long = "disable-rule", value_name = "NAME")]
    pub disabled_rules: Vec<String>,
    /// Run only these rules, may be repeated
    #[arg(long = "only", value_name = "NAME")]
    pub only_rules: Vec<String>,
    /// Lowest severity that makes the command fail
    #[arg(long = "minimum-failure-severity", default_value = "notice")]
    pub minimum_failure_severity: Severity,
    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ListRules {
    /// Output format
    #[arg(long = "format", short = 'f', value_enum, default_value_t = RulesOutputFormat::Table)]
    pub format: RulesOutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RulesOutputFormat {
    Table,
    Json,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct InitConfig {
    /// Overwrite an existing configuration file
    #[arg(long = "force", action = ArgAction::SetTrue)]
    pub force: bool,
}

pub const EXIT_OPERATIONAL_ERROR: i32 = 1;
pub const EXIT_ISSUES_FOUND: i32 = 2;

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context { logger: Some(logger) };

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => e.exit(),
    };

    match handle_command(opts, &ctx) {
        Ok(LintOutcome::Clean) => {}
        Ok(LintOutcome::IssuesFound) => process::exit(EXIT_ISSUES_FOUND),
        Ok(LintOutcome::RulesFailed) => process::exit(EXIT_OPERATIONAL_ERROR),
        Err(e) => {
            ctx.try_log(|logger| error!(logger, "{e}"));
            eprintln!("error: {e}");
            process::exit(EXIT_OPERATIONAL_ERROR);
        }
    }
}

fn handle_command(opts: Opts, ctx: &Context) -> Result<LintOutcome, lint::LinterError> {
    match opts.command {
        Command::Lint(cmd) => lint::run_lint(&cmd, ctx),
        Command::Rules(cmd) => {
            lint::list_rules(cmd.format)?;
            Ok(LintOutcome::Clean)
        }
        Command::Init(cmd) => {
            lint::init_config(cmd.force, ctx)?;
            Ok(LintOutcome::Clean)
        }
    }
}
