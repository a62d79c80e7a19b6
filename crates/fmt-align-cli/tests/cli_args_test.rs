use clap::error::ErrorKind;
use fmt_align_cli::parse_from;
use fmt_align_core::cuts::CutVerbosity;
use fmt_align_core::geometry::{ShiftColumn, DEFAULT_VARIATION};
use fmt_align_core::scan::AlignmentVariable;
use fmt_align_core::swim::SwimConfig;
use fmt_align_core::types::Layer;

fn parse(args: &[&str]) -> Result<fmt_align_cli::Args, clap::Error> {
    parse_from(std::iter::once("fmt-align").chain(args.iter().copied()))
}

#[test]
fn test_defaults() {
    let args = parse(&["run.jsonl"]).unwrap();
    assert_eq!(args.file.to_str(), Some("run.jsonl"));
    assert_eq!(args.nevents, None);
    assert_eq!(args.event_limit(), usize::MAX);
    assert_eq!(args.variation, DEFAULT_VARIATION);
    assert_eq!(args.verbosity(), CutVerbosity::Minimal);
    assert_eq!(args.swim_config(), SwimConfig::default());
    assert!(args.scan_plan().unwrap().is_none());
    assert_eq!(args.alignment(), Default::default());
}

#[test]
fn test_short_and_long_flags() {
    let short = parse(&[
        "run.jsonl", "-n", "500", "-c", "2", "-V", "rgf_test", "-s", "-1.0", "-1.0", "3.0",
    ])
    .unwrap();
    let long = parse(&[
        "--nevents",
        "500",
        "--cutsinfo",
        "2",
        "--variation",
        "rgf_test",
        "--swim",
        "-1.0",
        "-1.0",
        "3.0",
        "run.jsonl",
    ])
    .unwrap();

    for args in [short, long] {
        assert_eq!(args.nevents, Some(500));
        assert_eq!(args.event_limit(), 500);
        assert_eq!(args.verbosity(), CutVerbosity::Detailed);
        assert_eq!(args.variation, "rgf_test");
        assert_eq!(args.swim_config(), SwimConfig::new(-1.0, -1.0, 3.0));
    }
}

#[test]
fn test_scan_request() {
    let args = parse(&[
        "run.jsonl", "-v", "dZ", "-i", "0.2", "0.1", "-z", "0.5", "0.5", "0.5",
    ])
    .unwrap();

    let plan = args.scan_plan().unwrap().unwrap();
    assert_eq!(plan.variable, AlignmentVariable::DZ);
    let tested: Vec<f64> = plan
        .shifts(&args.alignment().shift_matrix())
        .iter()
        .map(|(_, m)| m.get(Layer::Second, ShiftColumn::Z))
        .collect();
    let expected = [0.3, 0.4, 0.5, 0.6, 0.7];
    assert_eq!(tested.len(), expected.len());
    assert!(tested.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-9));
}

#[test]
fn test_layer_alignment_flags() {
    let args = parse(&[
        "run.jsonl", "-x", "0.1", "0.2", "0.3", "--dy", "-0.1", "0", "0", "-Z", "1", "2", "3",
        "--rx", "4", "5", "6",
    ])
    .unwrap();

    let alignment = args.alignment();
    assert_eq!(alignment.dx, [0.1, 0.2, 0.3]);
    assert_eq!(alignment.dy, [-0.1, 0.0, 0.0]);
    assert_eq!(alignment.dz, [0.0; 3]);
    assert_eq!(alignment.rz, [1.0, 2.0, 3.0]);
    assert_eq!(alignment.rx, [4.0, 5.0, 6.0]);
}

#[test]
fn test_repeated_flag_keeps_last() {
    let args = parse(&["run.jsonl", "-n", "10", "-n", "20"]).unwrap();
    assert_eq!(args.nevents, Some(20));
}

#[test]
fn test_var_and_inter_go_together() {
    assert!(parse(&["run.jsonl", "-v", "dZ"]).is_err());
    assert!(parse(&["run.jsonl", "-i", "0.2", "0.1"]).is_err());
}

#[test]
fn test_rejected_arguments() {
    let cases: &[&[&str]] = &[
        &[],
        &["run.hipo"],
        &["run.jsonl", "other.jsonl"],
        &["run.jsonl", "-q", "1"],
        &["run.jsonl", "--unknown", "1"],
        &["run.jsonl", "-n", "many"],
        &["run.jsonl", "-n", "1.5"],
        &["run.jsonl", "-c", "3"],
        &["run.jsonl", "-c"],
        &["run.jsonl", "-v", "dx", "-i", "0.2", "0.1"],
        &["run.jsonl", "-v", "dZ", "-i", "0.2"],
        &["run.jsonl", "-v", "dZ", "-i", "0.2", "zero"],
        &["run.jsonl", "-s", "1", "2"],
        &["run.jsonl", "-x", "1", "2", "three"],
        &["run.jsonl", "-z", "1", "2", "3", "4"],
    ];

    for case in cases {
        assert!(parse(case).is_err(), "accepted {:?}", case);
    }
}

#[test]
fn test_invalid_scan_range_is_a_usage_error() {
    let err = parse(&["run.jsonl", "-v", "dZ", "-i", "0.2", "0"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);

    let err = parse(&["run.jsonl", "-v", "dZ", "-i", "-0.2", "0.1"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}

#[test]
fn test_oversized_scan_is_a_usage_error() {
    let err = parse(&["run.jsonl", "-v", "dZ", "-i", "1", "1e-300"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert!(err.to_string().contains("steps per side"));
}

#[test]
fn test_help_prints_usage() {
    let err = parse(&["--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    assert!(!err.use_stderr());
    assert!(err.to_string().contains("--inter"));
}
