//! # Command Line Parsing Tests

use crate::Cli;
use clap::Parser;
use splash_lib::SliderKind;

#[test]
fn site_defaults_to_dawlish() {
    let cli = Cli::try_parse_from(["splash-dashboard"]).unwrap();
    assert_eq!(cli.site, "Dawlish");
    assert!(!cli.submit);
}

#[test]
fn site_must_be_a_dropdown_label() {
    let cli =
        Cli::try_parse_from(["splash-dashboard", "--site", "Penzance Storm Bert - overtopping"])
            .unwrap();
    assert_eq!(cli.site, "Penzance Storm Bert - overtopping");

    assert!(Cli::try_parse_from(["splash-dashboard", "--site", "dawlish"]).is_err());
    assert!(Cli::try_parse_from(["splash-dashboard", "--site", "Torquay"]).is_err());
}

#[test]
fn negative_slider_values_are_accepted() {
    let cli = Cli::try_parse_from([
        "splash-dashboard",
        "--wind-direction",
        "-45",
        "--freeboard",
        "10",
        "--submit",
    ])
    .unwrap();
    assert_eq!(
        cli.slider_values(),
        vec![(SliderKind::Freeboard, 10), (SliderKind::WindDirection, -45)]
    );
    assert!(cli.submit);
}
