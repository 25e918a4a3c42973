use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, save_config, Config};
use crate::ranking::{MetricConfig, NormalizationMethod, RankingConfig};

/// Line-oriented prompts over any input/output pair.
struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompt user with a message and return their trimmed input.
    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("Failed to read input")?;
        Ok(line.trim().to_string())
    }

    /// Prompt user with a message and a default value. Returns default if input is empty.
    fn prompt_with_default(&mut self, message: &str, default: &str) -> Result<String> {
        let input = self.prompt(&format!("{} [{}]: ", message, default))?;
        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input)
        }
    }

    /// Prompt user with a yes/no question. Returns bool based on input and default.
    fn prompt_yes_no(&mut self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        let input = self.prompt(&format!("{} [{}]: ", message, hint))?;
        let input = input.to_lowercase();
        if input.is_empty() {
            Ok(default_yes)
        } else {
            Ok(input == "y" || input == "yes")
        }
    }

    /// Keep asking until the answer parses as a non-negative weight.
    fn prompt_weight(&mut self, message: &str, default: f64) -> Result<f64> {
        loop {
            let input = self.prompt_with_default(message, &default.to_string())?;
            match input.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => return Ok(v),
                _ => writeln!(self.output, "  Invalid: must be a non-negative number. Try again.")?,
            }
        }
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}

/// Run the interactive init wizard on stdin/stdout.
///
/// If `default_path` is Some, it is offered as the config file path.
/// Otherwise the default config path is offered.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_init_wizard_with(stdin.lock(), stdout.lock(), default_path).map(|_| ())
}

/// Wizard body. Returns the config that was written, or None when the user
/// declined to overwrite an existing file.
pub fn run_init_wizard_with<R: BufRead, W: Write>(
    input: R,
    output: W,
    default_path: Option<PathBuf>,
) -> Result<Option<Config>> {
    let mut p = Prompter { input, output };
    let defaults = RankingConfig::default();

    p.say("")?;
    p.say("Player Rank Configuration Wizard")?;
    p.say("================================")?;
    p.say("")?;

    // 1. Columns
    p.say("Which column names each player? It is shown next to the score.")?;
    let identity = p.prompt_with_default("Player column", &defaults.columns.identity)?;

    p.say("")?;
    p.say("Categorical columns you want to filter on, comma separated (e.g. 'Pos,Squad').")?;
    let filter_input = p.prompt_with_default("Filter columns", "none")?;
    let filter_columns: Vec<String> = if filter_input == "none" {
        Vec::new()
    } else {
        filter_input
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    };

    // 2. Method
    p.say("")?;
    p.say("Min-max rescales every metric to 0-1. Z-score centres each metric on its mean.")?;
    let method = loop {
        let input = p.prompt_with_default("Normalization method (min-max/z-score)", "min-max")?;
        match input.as_str() {
            "min-max" | "minmax" => break NormalizationMethod::MinMax,
            "z-score" | "zscore" => break NormalizationMethod::ZScore,
            _ => p.say("  Invalid: choose 'min-max' or 'z-score'. Try again.")?,
        }
    };

    // 3. Metrics
    p.say("")?;
    p.say("Weights are relative; they are rescaled to sum to 1. Use 0 to ignore a metric.")?;
    let use_default_metrics = p.prompt_yes_no("Start from the default metrics (xG, xA, G+A, ...)?", true)?;

    let mut metrics: Vec<MetricConfig> = Vec::new();
    if use_default_metrics {
        for metric in &defaults.metrics {
            let column = p.prompt_with_default(&format!("  {} column", metric.name), &metric.column)?;
            let weight = p.prompt_weight(&format!("  {} weight", metric.name), metric.weight)?;
            metrics.push(MetricConfig::new(&metric.name, &column, weight));
        }
    }

    let mut add_metric = p.prompt_yes_no("Add a custom metric?", !use_default_metrics)?;
    while add_metric {
        let column = loop {
            let c = p.prompt("  Column name: ")?;
            if !c.is_empty() {
                break c;
            }
            p.say("  Column name is required.")?;
        };
        let name = p.prompt_with_default("  Metric name", &column)?;
        let weight = p.prompt_weight("  Weight", 1.0)?;
        let reverse = p.prompt_yes_no("  Lower is better?", false)?;
        metrics.push(MetricConfig {
            reverse,
            ..MetricConfig::new(&name, &column, weight)
        });
        add_metric = p.prompt_yes_no("Add another custom metric?", false)?;
    }

    if metrics.iter().map(|m| m.weight).sum::<f64>() == 0.0 {
        p.say("Warning: all weights are zero; ranking will fail until one is raised.")?;
    }

    // 4. Input
    p.say("")?;
    let input_path = p.prompt_with_default("Default CSV file to rank (optional)", "none")?;
    let input_path = (input_path != "none").then_some(input_path);

    // 5. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    p.say("")?;
    let path_str = p.prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = p.prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", config_path.display()),
            false,
        )?;
        if !overwrite {
            p.say("Aborted.")?;
            return Ok(None);
        }
    }

    let config = Config {
        input: input_path,
        ranking: RankingConfig {
            columns: crate::ranking::ColumnRoles {
                identity,
                filters: filter_columns,
            },
            metrics,
            method,
            ..RankingConfig::default()
        },
        ..Config::default()
    };

    save_config(&config_path, &config)?;

    p.say("")?;
    p.say(&format!("Config written to {}", config_path.display()))?;
    p.say("Run `player-rank <file.csv>` to rank your players.")?;

    Ok(Some(config))
}
