use rust_xlsxwriter::Color;
use serde_json::json;
use spreadsheet_export::dataset;
use spreadsheet_export::module::ModuleError;
use spreadsheet_export::xlsx::{parse_cell_name, parse_color, workbook_from_json};

fn assert_workbook(bytes: &[u8]) {
    assert!(bytes.len() > 100, "workbook too small: {} bytes", bytes.len());
    assert_eq!(&bytes[..4], b"PK\x03\x04", "workbook is not a zip archive");
}

#[test]
fn parses_cell_names() {
    assert_eq!(parse_cell_name("a1").unwrap(), (0, 0));
    assert_eq!(parse_cell_name("E8").unwrap(), (7, 4));
    assert_eq!(parse_cell_name("AB12").unwrap(), (11, 27));
    assert_eq!(parse_cell_name("xfd1048576").unwrap(), (1_048_575, 16_383));

    for bad in ["", "1a", "a0", "a", "a-1", "xfe1", "a1048577"] {
        assert!(
            matches!(parse_cell_name(bad), Err(ModuleError::Conversion(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn parses_colors() {
    assert_eq!(parse_color("#F2F2F2").unwrap(), Color::RGB(0xF2F2F2));
    assert_eq!(parse_color("#f57c00").unwrap(), Color::RGB(0xF57C00));
    assert_eq!(parse_color("#abc").unwrap(), Color::RGB(0xAABBCC));
    assert!(parse_color("red").is_err());
    assert!(parse_color("#12345").is_err());
}

#[test]
fn converts_sample_datasets() {
    assert_workbook(&workbook_from_json(&dataset::sample_dataset()).unwrap());
    assert_workbook(&workbook_from_json(&dataset::styled_dataset()).unwrap());
}

#[test]
fn converts_mixed_values() {
    let payload = json!({
        "data": [
            { "cell": "a1", "value": "Total", "css": "header" },
            { "cell": "b1", "value": 10 },
            { "cell": "b2", "value": 2.5 },
            { "cell": "b3", "value": "=SUM(B1:B2)", "css": "header" },
            { "cell": "c1", "value": true },
            { "cell": "c2", "value": null, "css": "header" },
            { "cell": "c3", "css": "missing" }
        ],
        "styles": {
            "header": {
                "background": "#333",
                "color": "#FFFFFF",
                "font-weight": "bold",
                "text-align": "center"
            }
        }
    });

    assert_workbook(&workbook_from_json(&payload).unwrap());
}

#[test]
fn rejects_unusable_payloads() {
    for payload in [
        json!("not a sheet"),
        json!({ "cells": [] }),
        json!([{ "cell": "??", "value": 1 }]),
        json!([{ "cell": "a1", "value": [1, 2] }]),
        json!({ "data": [], "styles": { "bad": { "color": "blue" } } }),
    ] {
        assert!(
            matches!(workbook_from_json(&payload), Err(ModuleError::Conversion(_))),
            "{} should be rejected",
            payload
        );
    }
}

#[test]
fn accepts_a_single_cell_object() {
    assert_workbook(&workbook_from_json(&json!({ "cell": "a1", "value": "x" })).unwrap());
    assert_workbook(&workbook_from_json(&json!({ "cell": "C3", "value": 4, "css": "unused" })).unwrap());

    assert!(matches!(
        workbook_from_json(&json!({ "cell": "a0", "value": "x" })),
        Err(ModuleError::Conversion(_))
    ));
}
