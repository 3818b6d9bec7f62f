//! clinic-cycles: inspect and act on treatment cycles from the command line.
//!
//! Reads the clinic API settings from `CLINIC_CYCLES__*` environment variables
//! (or a `.env` file) and prints results as JSON on stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use clinic_cycles::adapters::http::HttpClinicApi;
use clinic_cycles::application::{
    CancelCycleCommand, CancelCycleHandler, CompleteCycleCommand, CompleteCycleHandler,
    ConfirmProcedureCommand, ConfirmProcedureHandler, CycleEligibilityView,
    GetCycleEligibilityHandler, GetCycleEligibilityQuery, PendingActions, StartCycleCommand,
    StartCycleHandler,
};
use clinic_cycles::config::{AppConfig, LogFormat};
use clinic_cycles::domain::cycle::{resolve_eligibility, Cycle};
use clinic_cycles::domain::foundation::{ActorContext, CycleId, DoctorId, Timestamp, UserId};
use clinic_cycles::domain::sample::{Sample, SampleKind, SampleReadiness};
use clinic_cycles::ports::{ClinicApi, ClinicApiError};
use clinic_cycles::telemetry;

#[derive(Parser)]
#[command(name = "clinic-cycles")]
#[command(about = "Treatment-cycle status and action eligibility for the clinic portal")]
struct Cli {
    /// Clinic API base URL (overrides CLINIC_CYCLES__API__BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Portal user issuing commands
    #[arg(long, env = "CLINIC_CYCLES_USER", default_value = "cli")]
    user: String,

    /// Doctor profile of the user
    #[arg(long, env = "CLINIC_CYCLES_DOCTOR_ID")]
    doctor_id: Option<DoctorId>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a cycle's state, type and allowed actions
    Show { cycle_id: CycleId },

    /// Start a planned or scheduled cycle
    Start {
        cycle_id: CycleId,
        /// Start date (defaults to now)
        #[arg(long, value_parser = parse_timestamp)]
        date: Option<Timestamp>,
    },

    /// Complete an in-progress cycle
    Complete {
        cycle_id: CycleId,
        #[arg(long, value_parser = parse_timestamp)]
        date: Option<Timestamp>,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Cancel a cycle that has not finished
    Cancel {
        cycle_id: CycleId,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Confirm the insemination of an IUI cycle at the procedure step
    ConfirmProcedure {
        cycle_id: CycleId,
        #[arg(long, value_parser = parse_timestamp)]
        date: Option<Timestamp>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Resolve eligibility for a cycle JSON document without calling the API
    ///
    /// Without --samples, samples are treated as not required, so a cycle at
    /// the IVF collection step is never blocked on them.
    Classify {
        /// Path to the cycle JSON, or `-` for stdin
        file: PathBuf,
        /// JSON array of the patient's sperm and oocyte samples
        #[arg(long)]
        samples: Option<PathBuf>,
    },
}

fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    Timestamp::parse(raw).ok_or_else(|| format!("not a date: {}", raw))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the refetched view, or a note when the action was applied but the
/// cycle could not be read back.
fn print_applied(
    view: Option<CycleEligibilityView>,
    refresh_error: Option<ClinicApiError>,
) -> anyhow::Result<()> {
    match view {
        Some(view) => print_json(&view),
        None => {
            let error = refresh_error.map(|e| e.to_string());
            warn!(error = ?error, "Action applied; refetch the cycle with `show`");
            print_json(&serde_json::json!({ "applied": true, "refreshError": error }))
        }
    }
}

fn readiness_from(samples: &[Sample]) -> SampleReadiness {
    let (sperm, oocyte): (Vec<Sample>, Vec<Sample>) = samples
        .iter()
        .cloned()
        .partition(|s| s.sample_type == SampleKind::Sperm);
    SampleReadiness::evaluate(&sperm, &oocyte)
}

fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if cli.json_logs {
        config.logging.format = LogFormat::Json;
    }
    telemetry::init(&config.logging)?;

    if let Command::Classify { file, samples } = &cli.command {
        let cycle: Cycle = serde_json::from_str(&read_input(file)?)?;
        let readiness = match samples {
            Some(path) => {
                let samples: Vec<Sample> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                readiness_from(&samples)
            }
            None => SampleReadiness::not_required(),
        };
        return print_json(&resolve_eligibility(&cycle, &readiness));
    }

    config.validate()?;
    info!(base_url = %config.api.base_url, "Using clinic API");

    let api: Arc<dyn ClinicApi> = Arc::new(HttpClinicApi::new(config.api.to_client_config())?);
    let pending = Arc::new(PendingActions::new());

    let mut ctx = ActorContext::new(UserId::new(cli.user)?).with_source("cli");
    if let Some(doctor_id) = cli.doctor_id {
        ctx = ctx.with_doctor(doctor_id);
    }

    match cli.command {
        Command::Show { cycle_id } => {
            let view = GetCycleEligibilityHandler::new(api)
                .handle(GetCycleEligibilityQuery { cycle_id })
                .await?;
            print_json(&view)
        }
        Command::Start { cycle_id, date } => {
            let cmd = StartCycleCommand {
                cycle_id,
                start_date: date,
            };
            let result = StartCycleHandler::new(api, pending).handle(cmd, ctx).await?;
            print_applied(result.view, result.refresh_error)
        }
        Command::Complete {
            cycle_id,
            date,
            outcome,
            notes,
        } => {
            let cmd = CompleteCycleCommand {
                cycle_id,
                end_date: date,
                outcome,
                notes,
            };
            let result = CompleteCycleHandler::new(api, pending).handle(cmd, ctx).await?;
            print_applied(result.view, result.refresh_error)
        }
        Command::Cancel {
            cycle_id,
            reason,
            notes,
        } => {
            let cmd = CancelCycleCommand {
                cycle_id,
                reason,
                notes,
            };
            let result = CancelCycleHandler::new(api, pending).handle(cmd, ctx).await?;
            print_applied(result.view, result.refresh_error)
        }
        Command::ConfirmProcedure {
            cycle_id,
            date,
            notes,
        } => {
            let cmd = ConfirmProcedureCommand {
                cycle_id,
                procedure_date: date,
                notes,
            };
            let result = ConfirmProcedureHandler::new(api, pending)
                .handle(cmd, ctx)
                .await?;
            print_applied(result.view, result.refresh_error)
        }
        Command::Classify { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_cycles::domain::foundation::{PatientId, SampleId, TreatmentId};

    #[test]
    fn classify_samples_gate_the_collection_step() {
        let patient = PatientId::new();
        let samples = vec![
            Sample::new(SampleId::new(), patient, SampleKind::Sperm).with_status("QualityChecked"),
            Sample::new(SampleId::new(), patient, SampleKind::Oocyte).with_status("Collected"),
        ];
        let cycle: Cycle = serde_json::from_value(serde_json::json!({
            "id": CycleId::new(),
            "treatmentId": TreatmentId::new(),
            "patientId": patient,
            "treatmentType": "IVF",
            "stepType": "IVF_OPU",
            "status": "InProgress"
        }))
        .unwrap();

        let readiness = readiness_from(&samples);

        assert_eq!(readiness.missing, std::collections::BTreeSet::from([SampleKind::Oocyte]));
        assert!(!resolve_eligibility(&cycle, &readiness).can_complete);
        assert!(resolve_eligibility(&cycle, &SampleReadiness::not_required()).can_complete);
    }
}
