//! Extraction passes over an event file

use crate::args::Args;
use anyhow::Context;
use fmt_align_core::prelude::*;
use fmt_align_core::cuts::{CutReport, CutVerbosity};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Environment variable holding the calibration file path
pub const CALIBRATION_ENV: &str = "FMT_ALIGN_CALIBRATION";

/// Environment variable holding the optional cut configuration path
pub const CUTS_ENV: &str = "FMT_ALIGN_CUTS";

/// Minimum filled layers for a group to be counted
pub const MIN_FILLED: usize = 3;

/// File locations taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub calibration: PathBuf,
    pub cuts: Option<PathBuf>,
}

impl RunContext {
    pub fn from_env() -> anyhow::Result<Self> {
        let calibration = std::env::var_os(CALIBRATION_ENV)
            .map(PathBuf::from)
            .with_context(|| format!("{} must point to a calibration file", CALIBRATION_ENV))?;
        Ok(Self {
            calibration,
            cuts: std::env::var_os(CUTS_ENV).map(PathBuf::from),
        })
    }
}

/// Result of one extraction pass
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetResult {
    /// Offset of the scanned variable from its nominal value
    pub offset: f64,
    /// Events read from the file
    pub events_read: u64,
    /// Events dropped for a malformed bank
    pub skipped: u64,
    pub summary: ExtractionSummary,
    pub cuts: CutReport,
}

/// Results of every pass of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub variation: String,
    pub variable: Option<AlignmentVariable>,
    pub passes: Vec<OffsetResult>,
}

impl RunReport {
    pub fn render(&self, verbosity: CutVerbosity) -> String {
        let mut out = String::new();
        match self.variable {
            Some(variable) => {
                let _ = writeln!(out, "Variation {}, scanning {}", self.variation, variable);
            }
            None => {
                let _ = writeln!(out, "Variation {}, nominal alignment", self.variation);
            }
        }
        for pass in &self.passes {
            let _ = writeln!(
                out,
                "offset {:+.4}: {} events ({} with tracks, {} skipped), {} groups, {} points",
                pass.offset,
                pass.events_read,
                pass.summary.events,
                pass.skipped,
                pass.summary.groups,
                pass.summary.points
            );
            out.push_str(&pass.cuts.render(pass.summary.candidates, verbosity));
        }
        out
    }
}

/// Run every requested pass over the event file
pub fn run(args: &Args, context: &RunContext) -> anyhow::Result<RunReport> {
    let store = CalibrationStore::from_file(&context.calibration)?;
    let planes = store
        .reference_planes(&args.variation)
        .with_context(|| format!("loading geometry from {}", context.calibration.display()))?;

    let cut_config = match &context.cuts {
        Some(path) => FiducialCutConfig::from_file(path)?,
        None => FiducialCutConfig::default(),
    };
    let swimmer = HelixSwimmer::new(args.swim_config());
    let nominal = args.alignment().shift_matrix();

    let plan = args.scan_plan()?;
    let geometries = match &plan {
        Some(plan) => {
            if !plan.variable.affects_extraction() {
                tracing::warn!(
                    "{} does not move the reference planes, every pass extracts the same points",
                    plan.variable
                );
            }
            plan.shifts(&nominal)
        }
        None => vec![(0.0, nominal)],
    };
    tracing::info!("Running {} extraction pass(es)", geometries.len());

    let mut passes = Vec::with_capacity(geometries.len());
    for (offset, shifts) in geometries {
        let cuts = FiducialCuts::new(cut_config.clone())?;
        let extractor = TrajectoryExtractor::new(
            &swimmer,
            &cuts,
            &planes,
            &shifts,
            ExtractorConfig::new(MIN_FILLED),
        );
        let mut pass = extract_file(&args.file, args.event_limit(), &extractor)
            .with_context(|| format!("extracting at offset {:+.4}", offset))?;
        pass.offset = offset;
        pass.cuts = cuts.report();
        tracing::debug!("Offset {:+.4}: {:?}", offset, pass.summary);
        passes.push(pass);
    }

    Ok(RunReport {
        variation: args.variation.clone(),
        variable: plan.map(|p| p.variable),
        passes,
    })
}

fn extract_file<P, C>(
    path: &Path,
    limit: usize,
    extractor: &TrajectoryExtractor<'_, P, C>,
) -> anyhow::Result<OffsetResult>
where
    P: TrackPropagator + ?Sized,
    C: CutEngine + ?Sized,
{
    let mut result = OffsetResult {
        offset: 0.0,
        events_read: 0,
        skipped: 0,
        summary: ExtractionSummary::default(),
        cuts: CutReport::default(),
    };

    for event in EventFileReader::open(path)?.take(limit) {
        let event = event?;
        result.events_read += 1;
        match extractor.extract(&event) {
            Ok(Some(extraction)) => result.summary += extraction.summary(),
            Ok(None) => {}
            Err(AlignError::Bank(e)) => {
                tracing::warn!("Skipping event {}: {}", result.events_read, e);
                result.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(result)
}
