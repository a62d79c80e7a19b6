//! Command line arguments

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use fmt_align_core::bank::has_event_extension;
use fmt_align_core::cuts::CutVerbosity;
use fmt_align_core::geometry::DEFAULT_VARIATION;
use fmt_align_core::scan::{AlignmentVariable, LayerAlignment, ScanPlan, ScanRange};
use fmt_align_core::swim::SwimConfig;
use std::ffi::OsString;
use std::path::PathBuf;

/// Full usage text, printed on `--help` and after any argument error
pub const USAGE: &str = "\
Usage: fmt-align <file> [-n --nevents] [-v --var] [-i --inter]
                        [-s --swim] [-c --cutsinfo] [-V --variation]
                        [-x --dx] [-y --dy] [-z --dz]
                        [-X --rx] [-Y --ry] [-Z --rz]
  * file      : event file, one JSON event per line (.jsonl).
  * nevents   : number of events to read. Reads the whole file if unset.
  * var       : alignment variable to scan: dXY, dZ, rXY or rZ.
  * inter (2) : [0] distance from the nominal value to the furthest
                    tested value.
                [1] step between tested values, from <nominal - range>
                    to <nominal + range>.
  * swim  (3) : magnetic field setup. Defaults to (-0.75, -1.0, -3.0).
                [0] solenoid scale.
                [1] torus scale.
                [2] torus shift.
  * cutsinfo  : cut summary detail. 0 is none, 1 is minimal, 2 is
                detailed. Defaults to 1.
  * variation : calibration variation. Defaults to rgf_spring2020.
  * dx    (3) : x shift of each FMT layer.
  * dy    (3) : y shift of each FMT layer.
  * dz    (3) : z shift of each FMT layer.
  * rx    (3) : x rotation of each FMT layer.
  * ry    (3) : y rotation of each FMT layer.
  * rz    (3) : z rotation of each FMT layer.

With --var dZ, --inter 0.2 0.1 and --dz 0.5 0.5 0.5 the tested z shifts
are 0.3, 0.4, 0.5, 0.6 and 0.7. Unset shifts and rotations are 0 for
every layer; --var and --inter go together.

Lengths are in cm, angles in degrees. The calibration file location is
read from FMT_ALIGN_CALIBRATION (geometry in mm) and an optional cut
configuration from FMT_ALIGN_CUTS; both may be set in a .env file.
";

/// FMT trajectory extraction and alignment scans
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fmt-align",
    disable_version_flag = true,
    allow_negative_numbers = true,
    args_override_self = true,
    override_help = USAGE
)]
pub struct Args {
    /// Event file
    #[arg(value_name = "FILE", value_parser = parse_event_path)]
    pub file: PathBuf,

    /// Number of events to read
    #[arg(short = 'n', long = "nevents")]
    pub nevents: Option<u64>,

    /// Cut summary detail
    #[arg(
        short = 'c',
        long = "cutsinfo",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub cutsinfo: u8,

    /// Alignment variable to scan
    #[arg(short = 'v', long = "var", requires = "inter")]
    pub var: Option<AlignmentVariable>,

    /// Calibration variation
    #[arg(short = 'V', long = "variation", default_value = DEFAULT_VARIATION)]
    pub variation: String,

    /// Scan range and step
    #[arg(short = 'i', long = "inter", num_args = 2, action = ArgAction::Set,
          value_names = ["RANGE", "STEP"], requires = "var")]
    pub inter: Option<Vec<f64>>,

    /// Solenoid scale, torus scale, torus shift
    #[arg(short = 's', long = "swim", num_args = 3, action = ArgAction::Set)]
    pub swim: Option<Vec<f64>>,

    #[arg(short = 'x', long = "dx", num_args = 3, action = ArgAction::Set)]
    pub dx: Option<Vec<f64>>,

    #[arg(short = 'y', long = "dy", num_args = 3, action = ArgAction::Set)]
    pub dy: Option<Vec<f64>>,

    #[arg(short = 'z', long = "dz", num_args = 3, action = ArgAction::Set)]
    pub dz: Option<Vec<f64>>,

    #[arg(short = 'X', long = "rx", num_args = 3, action = ArgAction::Set)]
    pub rx: Option<Vec<f64>>,

    #[arg(short = 'Y', long = "ry", num_args = 3, action = ArgAction::Set)]
    pub ry: Option<Vec<f64>>,

    #[arg(short = 'Z', long = "rz", num_args = 3, action = ArgAction::Set)]
    pub rz: Option<Vec<f64>>,
}

fn parse_event_path(s: &str) -> Result<PathBuf, String> {
    if has_event_extension(s) {
        Ok(PathBuf::from(s))
    } else {
        Err(format!("expected a .{} event file", fmt_align_core::bank::EVENT_FILE_EXTENSION))
    }
}

/// Parse and check the arguments, program name first
pub fn parse_from<I, T>(args: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = Args::try_parse_from(args)?;
    if let Err(e) = args.scan_plan() {
        return Err(Args::command().error(ErrorKind::ValueValidation, e));
    }
    Ok(args)
}

fn values<const N: usize>(values: &Option<Vec<f64>>) -> Option<[f64; N]> {
    values
        .as_deref()
        .and_then(|v| <[f64; N]>::try_from(v).ok())
}

impl Args {
    pub fn swim_config(&self) -> SwimConfig {
        values(&self.swim)
            .map(SwimConfig::from_array)
            .unwrap_or_default()
    }

    /// Nominal alignment, zero for every layer where unset
    pub fn alignment(&self) -> LayerAlignment {
        LayerAlignment {
            dx: values(&self.dx).unwrap_or_default(),
            dy: values(&self.dy).unwrap_or_default(),
            dz: values(&self.dz).unwrap_or_default(),
            rx: values(&self.rx).unwrap_or_default(),
            ry: values(&self.ry).unwrap_or_default(),
            rz: values(&self.rz).unwrap_or_default(),
        }
    }

    /// Requested scan, `None` for a single pass at the nominal alignment
    pub fn scan_plan(&self) -> fmt_align_core::Result<Option<ScanPlan>> {
        match (self.var, values::<2>(&self.inter)) {
            (Some(variable), Some([range, step])) => {
                Ok(Some(ScanPlan::new(variable, ScanRange::new(range, step)?)))
            }
            _ => Ok(None),
        }
    }

    pub fn verbosity(&self) -> CutVerbosity {
        CutVerbosity::from_level(self.cutsinfo).unwrap_or_default()
    }

    /// Event limit as an iterator length
    pub fn event_limit(&self) -> usize {
        self.nevents
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX))
    }
}
