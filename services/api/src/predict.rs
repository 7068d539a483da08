use clap::Args;
use heartcheck::error::AppError;
use heartcheck::prediction::{
    load_classifier, ClassifierAdapter, Configuration, DecisionRouter, HeuristicOutcome,
    ModelDescription, PatientRecord, RuleProfile,
};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    /// JSON record to score. Reads stdin when omitted or `-`.
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// Trained model file. Heuristic rules are used when omitted.
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Rule profile used for heuristic scoring (full or lite)
    #[arg(long)]
    pub(crate) profile: Option<RuleProfile>,
    /// Print the heuristic rule contributions after the payload
    #[arg(long)]
    pub(crate) explain: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ModelInspectArgs {
    /// Model file to load
    #[arg(long)]
    pub(crate) path: PathBuf,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs {
        input,
        model,
        profile,
        explain,
    } = args;

    let body = read_input(input.as_deref())?;
    let configuration = build_configuration(profile.unwrap_or_default(), model.as_deref());
    let router = DecisionRouter::new(Arc::new(configuration));

    let prediction = router.predict_payload(&body);
    println!("{}", serde_json::to_string_pretty(&prediction.into_payload())?);

    if explain {
        match serde_json::from_slice::<PatientRecord>(&body) {
            Ok(record) => match router.scorer().score(&record) {
                Ok(outcome) => {
                    for line in explain_lines(&outcome) {
                        println!("{line}");
                    }
                }
                Err(err) => println!("\nRule contributions unavailable: {err}"),
            },
            Err(err) => println!("\nRule contributions unavailable: {err}"),
        }
    }

    Ok(())
}

pub(crate) fn run_model_inspect(args: ModelInspectArgs) -> Result<(), AppError> {
    let classifier = load_classifier(&args.path)?;
    let description = ClassifierAdapter::new(classifier).describe();
    for line in describe_lines(&args.path, &description) {
        println!("{line}");
    }
    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>, AppError> {
    match input {
        Some(path) if path != Path::new("-") => Ok(fs::read(path)?),
        _ => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

// The CLI reports load failures directly; telemetry is not initialised here.
fn build_configuration(profile: RuleProfile, model: Option<&Path>) -> Configuration {
    let Some(path) = model else {
        return Configuration::heuristic_only(profile);
    };
    match load_classifier(path) {
        Ok(classifier) => Configuration::with_classifier(classifier, profile),
        Err(err) => {
            eprintln!(
                "model {} unavailable ({err}); using {profile} heuristic rules",
                path.display()
            );
            Configuration::heuristic_only(profile)
        }
    }
}

pub(crate) fn explain_lines(outcome: &HeuristicOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "\nRule contributions ({} profile, threshold {})",
        outcome.profile,
        outcome.profile.threshold()
    )];
    if outcome.contributions.is_empty() {
        lines.push("- no rule fired".to_string());
    }
    for contribution in &outcome.contributions {
        lines.push(format!(
            "- {}: +{} {}",
            contribution.attribute,
            contribution.points,
            contribution.label.unwrap_or("(no factor label)")
        ));
    }
    lines.push(format!(
        "Score {} (capped at 100) -> {}",
        outcome.risk_score,
        if outcome.has_heart_disease {
            "elevated risk"
        } else {
            "below threshold"
        }
    ));
    lines
}

pub(crate) fn describe_lines(path: &Path, description: &ModelDescription) -> Vec<String> {
    let mut lines = vec![
        format!("Model file: {}", path.display()),
        format!("- type: {}", description.model_type),
        format!(
            "- probability estimates: {}",
            if description.has_probability {
                "yes"
            } else {
                "no (label only)"
            }
        ),
        format!("- features ({}):", description.feature_names.len()),
    ];
    for (index, name) in description.feature_names.iter().enumerate() {
        lines.push(format!("  {:>2}. {}", index + 1, name));
    }
    lines
}
