// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    seconds = { 5, "5s" },
    minutes = { 120, "2m" },
    hours = { 3600, "1h" },
    hours_and_minutes = { 5400, "1h30m" },
    days = { 259200, "3d" },
)]
fn format_elapsed_cases(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}

#[parameterized(
    seconds = { "30s", Some(30) },
    minutes = { "5m", Some(300) },
    hours = { "6h", Some(21600) },
    days = { "1d", Some(86400) },
    garbage = { "soon", None },
    empty = { "", None },
    no_unit = { "42", None },
)]
fn parse_interval_cases(input: &str, expected: Option<u64>) {
    assert_eq!(parse_interval_secs(input), expected);
}
