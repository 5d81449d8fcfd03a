//! Tests for the usage recorder: recording, summaries, and exports.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use schengen_engine::usage::CSV_HEADER;
use schengen_engine::{
    calculate_compliance, ClientMetadata, EngineError, ExportFormat, Stay, UsageRecorder,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 30, 0).unwrap()
}

fn client(tz: &str) -> ClientMetadata {
    ClientMetadata {
        timezone: tz.to_string(),
        user_agent: None,
    }
}

fn stays(lengths: &[i64]) -> Vec<Stay> {
    // Non-overlapping stays of the given inclusive lengths, a week apart,
    // starting 2024-01-01.
    let mut out = Vec::new();
    let mut entry = d("2024-01-01");
    for &len in lengths {
        let exit = entry + chrono::Duration::days(len - 1);
        out.push(Stay::new("FR", entry, exit).unwrap());
        entry = exit + chrono::Duration::days(7);
    }
    out
}

// ── Recording ───────────────────────────────────────────────────────────────

#[test]
fn record_captures_aggregate_numbers() {
    let mut recorder = UsageRecorder::new("session-1");
    let result = calculate_compliance(&stays(&[4, 10]), d("2024-03-01"));
    let snapshot = recorder.record(&result, client("Europe/Paris"), at(9));

    assert_eq!(snapshot.session_id, "session-1");
    assert_eq!(snapshot.days_used, 14);
    assert_eq!(snapshot.days_remaining, 76);
    assert!(snapshot.is_compliant);
    assert_eq!(snapshot.trip_count, 2);
    assert_eq!(snapshot.average_trip_length, 7.0);
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.snapshots()[0], snapshot);
}

#[test]
fn average_trip_length_uses_full_stay_not_clamped_part() {
    // 20-day stay of which only the last 6 days fall inside the window.
    let stay = Stay::new("FR", d("2023-07-06"), d("2023-07-25")).unwrap();
    let result = calculate_compliance(&[stay], d("2024-01-15"));
    assert_eq!(result.days_used, 6);

    let mut recorder = UsageRecorder::new("s");
    let snapshot = recorder.record(&result, client("UTC"), at(0));
    assert_eq!(snapshot.average_trip_length, 20.0);
}

#[test]
fn empty_history_records_zero_trips() {
    let mut recorder = UsageRecorder::new("s");
    let snapshot = recorder.record(&calculate_compliance(&[], d("2024-01-01")), client("UTC"), at(1));
    assert_eq!(snapshot.trip_count, 0);
    assert_eq!(snapshot.average_trip_length, 0.0);
}

#[test]
fn random_sessions_differ() {
    let a = UsageRecorder::with_random_session();
    let b = UsageRecorder::with_random_session();
    assert_ne!(a.session_id(), b.session_id());
    assert!(a.is_empty());
}

#[test]
fn clear_empties_log_but_keeps_session() {
    let mut recorder = UsageRecorder::new("keep-me");
    recorder.record(&calculate_compliance(&[], d("2024-01-01")), client("UTC"), at(1));
    recorder.clear();
    assert!(recorder.is_empty());
    assert_eq!(recorder.session_id(), "keep-me");
}

// ── Summaries ───────────────────────────────────────────────────────────────

#[test]
fn summary_of_empty_recorder_is_zeroed() {
    let summary = UsageRecorder::new("s").summarize();
    assert_eq!(summary.total_snapshots, 0);
    assert_eq!(summary.compliance_rate, 0.0);
    assert!(summary.by_timezone.is_empty());
}

#[test]
fn summary_aggregates_all_dimensions() {
    let mut recorder = UsageRecorder::new("s");
    let reference = d("2024-06-01");

    // Short trips (avg 3), compliant.
    recorder.record(&calculate_compliance(&stays(&[3, 3]), reference), client("Europe/Berlin"), at(8));
    // Medium trips (avg 10), five of them: many trips.
    recorder.record(
        &calculate_compliance(&stays(&[10, 10, 10, 10, 10]), reference),
        client("Europe/Berlin"),
        at(8),
    );
    // One long trip, over the limit.
    recorder.record(&calculate_compliance(&stays(&[100]), d("2024-04-09")), client("America/New_York"), at(22));
    // No trips at all.
    recorder.record(&calculate_compliance(&[], reference), client("UTC"), at(22));

    let summary = recorder.summarize();
    assert_eq!(summary.total_snapshots, 4);
    assert_eq!(summary.compliance_rate, 0.75);
    assert_eq!(summary.average_days_used, (6.0 + 50.0 + 100.0 + 0.0) / 4.0);
    assert_eq!(summary.trip_length_histogram.short, 1);
    assert_eq!(summary.trip_length_histogram.medium, 1);
    assert_eq!(summary.trip_length_histogram.long, 1);
    assert_eq!(summary.histories_with_many_trips, 1);
    assert_eq!(summary.by_timezone["Europe/Berlin"], 2);
    assert_eq!(summary.by_timezone["America/New_York"], 1);
    assert_eq!(summary.by_timezone["UTC"], 1);
    // 08:30 UTC is 10:30 in Berlin and 22:30 UTC is 18:30 in New York (summer time).
    assert_eq!(summary.by_hour[&10], 2);
    assert_eq!(summary.by_hour[&18], 1);
    assert_eq!(summary.by_hour[&22], 1);
    assert!(!summary.by_hour.contains_key(&8));
}

#[test]
fn by_hour_uses_client_local_time() {
    let mut recorder = UsageRecorder::new("s");
    let result = calculate_compliance(&[], d("2024-01-15"));
    // 23:30 UTC in January: 08:30 the next day in Tokyo, 00:30 in Paris.
    let late = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
    recorder.record(&result, client("Asia/Tokyo"), late);
    recorder.record(&result, client("Europe/Paris"), late);
    recorder.record(&result, client("Not/AZone"), late);

    let summary = recorder.summarize();
    assert_eq!(summary.by_hour[&8], 1);
    assert_eq!(summary.by_hour[&0], 1);
    // Unknown timezone names fall back to the UTC hour.
    assert_eq!(summary.by_hour[&23], 1);
}

// ── Export ──────────────────────────────────────────────────────────────────

#[test]
fn csv_export_has_header_and_one_row_per_snapshot() {
    let mut recorder = UsageRecorder::new("abc");
    recorder.record(&calculate_compliance(&stays(&[5]), d("2024-02-01")), client("Europe/Rome"), at(12));
    recorder.record(&calculate_compliance(&[], d("2024-02-01")), client("UTC"), at(13));

    let csv = recorder.export(ExportFormat::Csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "2024-06-01T12:30:00+00:00,abc,5,85,true,1,Europe/Rome");
    assert_eq!(lines[2], "2024-06-01T13:30:00+00:00,abc,0,90,true,0,UTC");
}

#[test]
fn csv_export_quotes_fields_with_delimiters() {
    let mut recorder = UsageRecorder::new("a,b");
    recorder.record(&calculate_compliance(&[], d("2024-02-01")), client("Odd \"zone\""), at(0));
    let csv = recorder.export(ExportFormat::Csv).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert_eq!(row, "2024-06-01T00:30:00+00:00,\"a,b\",0,90,true,0,\"Odd \"\"zone\"\"\"");
}

#[test]
fn csv_export_quotes_embedded_newlines() {
    let mut recorder = UsageRecorder::new("s");
    recorder.record(&calculate_compliance(&[], d("2024-02-01")), client("two\nlines"), at(0));
    let csv = recorder.export(ExportFormat::Csv).unwrap();
    assert!(csv.ends_with(",0,90,true,0,\"two\nlines\"\n"), "unexpected: {:?}", csv);
}

#[test]
fn csv_export_of_empty_recorder_is_header_only() {
    let csv = UsageRecorder::new("s").export(ExportFormat::Csv).unwrap();
    assert_eq!(csv, format!("{}\n", CSV_HEADER));
}

#[test]
fn json_export_is_the_summary() {
    let mut recorder = UsageRecorder::new("s");
    recorder.record(&calculate_compliance(&stays(&[8]), d("2024-02-01")), client("UTC"), at(5));
    let json = recorder.export(ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_snapshots"], 1);
    assert_eq!(value["compliance_rate"], 1.0);
    assert_eq!(value["trip_length_histogram"]["7_to_30"], 1);
    assert_eq!(value["by_timezone"]["UTC"], 1);
    assert_eq!(value["by_hour"]["5"], 1);
}

#[test]
fn export_format_parses_case_insensitively() {
    assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
    assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    let err = "XML".parse::<ExportFormat>().unwrap_err();
    assert!(matches!(err, EngineError::UnknownExportFormat(ref f) if f == "XML"));
    assert!(err.to_string().contains("'XML'"));
}
