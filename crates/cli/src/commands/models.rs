//! `citewright models` — List the model catalog.

use citewright_config::AppConfig;
use citewright_core::event::Stage;

use super::{CliResult, load_config};

pub async fn run() -> CliResult {
    let config = load_config()?;
    print!("{}", render(&config));
    Ok(())
}

fn render(config: &AppConfig) -> String {
    let width = config.models.iter().map(|m| m.name.len()).max().unwrap_or(0);
    let mut out = String::from("🤖 Models\n=========\n\n");

    for m in &config.models {
        let marker = if m.name.eq_ignore_ascii_case(&config.default_model) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!("  {marker} {:<width$}  {}\n", m.name, m.id));
    }
    out.push_str("\n  * default\n");

    let overrides: Vec<String> = [Stage::Research, Stage::Validation, Stage::Writer, Stage::Citation]
        .into_iter()
        .filter_map(|stage| {
            let over = config.stages.get(stage);
            let model = over.model.as_deref();
            let temp = over.temperature.map(|t| format!("temperature {t}"));
            match (model, temp) {
                (None, None) => None,
                (Some(m), None) => Some(format!("  {stage}: {m}")),
                (None, Some(t)) => Some(format!("  {stage}: {t}")),
                (Some(m), Some(t)) => Some(format!("  {stage}: {m}, {t}")),
            }
        })
        .collect();

    if !overrides.is_empty() {
        out.push_str("\n  Stage overrides:\n");
        for line in overrides {
            out.push_str(&format!("  {line}\n"));
        }
    }
    out
}
