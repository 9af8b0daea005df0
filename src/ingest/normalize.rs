//! Column alias resolution and grouping by train number.

use std::collections::HashMap;

use super::reader::{ParsedCsv, RawRecord, SkippedRow};

// Accepted column names per canonical field, matched case-insensitively.
// The first name is the current export header; the rest are historical.
const TRAIN_NUMBER: &[&str] = &["trainnumber", "trainno", "train"];
const TRAIN_NAME: &[&str] = &["trainname", "name"];
const STATION_FROM: &[&str] = &["stationfrom", "source", "from"];
const STATION_TO: &[&str] = &["stationto", "destination", "to"];
const RUNNING_DAYS: &[&str] = &["runningdays", "trainrunson", "days"];
const STATION_SEQUENCE: &[&str] = &["stnnumber", "stationsequence", "seq"];
const STATION_CODE: &[&str] = &["stationcode", "stncode"];
const STATION_NAME: &[&str] = &["stationname", "stnname"];
const ARRIVES: &[&str] = &["arrives", "arrivaltime", "arrival"];
const DEPARTS: &[&str] = &["departs", "departuretime", "departure"];
const STOP_DURATION: &[&str] = &["stopduration", "halt"];
const DISTANCE: &[&str] = &["distance", "km"];
const PLATFORM: &[&str] = &["platform", "platformnumber"];
const ROUTE_FLAG: &[&str] = &["routeflag", "route"];
const DAY: &[&str] = &["day", "daycount"];

/// Per-stop fields of a normalized row, before an identifier is attached.
#[derive(Debug, Clone)]
pub struct StopDraft {
    pub station_sequence: Option<i64>,
    pub station_code: Option<String>,
    pub station_name: Option<String>,
    pub arrives: Option<String>,
    pub departs: Option<String>,
    pub stop_duration: Option<String>,
    pub distance: Option<String>,
    pub platform: Option<String>,
    pub route_flag: Option<i64>,
    pub day: Option<i64>,
}

/// All rows of one train in the batch, with the train-level fields the
/// commit step denormalizes across every inserted row. Train-level fields
/// take the first non-empty value seen for the train.
#[derive(Debug, Clone)]
pub struct NormalizedTrain {
    pub train_number: String,
    pub train_name: Option<String>,
    pub station_from: Option<String>,
    pub station_to: Option<String>,
    pub running_days: Option<String>,
    pub stops: Vec<StopDraft>,
}

/// A parsed batch grouped by train number, preserving the order in which
/// each train first appeared in the upload.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub trains: Vec<NormalizedTrain>,
    pub skipped: Vec<SkippedRow>,
}

impl NormalizedBatch {
    pub fn train_numbers(&self) -> Vec<String> {
        self.trains.iter().map(|t| t.train_number.clone()).collect()
    }
}

fn field(record: &RawRecord, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| record.fields.get(*alias))
        .cloned()
}

fn numeric_field(record: &RawRecord, aliases: &[&str]) -> Option<i64> {
    field(record, aliases).and_then(|v| v.parse().ok())
}

/// Group parsed records by train number. Records without a resolvable
/// train number are dropped with a diagnostic; everything else is carried
/// through best-effort.
pub fn normalize(parsed: ParsedCsv) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        trains: Vec::new(),
        skipped: parsed.skipped,
    };
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in &parsed.records {
        let Some(train_number) = field(record, TRAIN_NUMBER) else {
            batch.skipped.push(SkippedRow {
                row: record.line,
                reason: "missing train number".to_string(),
            });
            continue;
        };

        let stop = StopDraft {
            station_sequence: numeric_field(record, STATION_SEQUENCE),
            station_code: field(record, STATION_CODE),
            station_name: field(record, STATION_NAME),
            arrives: field(record, ARRIVES),
            departs: field(record, DEPARTS),
            stop_duration: field(record, STOP_DURATION),
            distance: field(record, DISTANCE),
            platform: field(record, PLATFORM),
            route_flag: numeric_field(record, ROUTE_FLAG),
            day: numeric_field(record, DAY),
        };

        match index.get(&train_number) {
            Some(&i) => {
                let train = &mut batch.trains[i];
                // Backfill train-level fields the first row left empty.
                if train.train_name.is_none() {
                    train.train_name = field(record, TRAIN_NAME);
                }
                if train.station_from.is_none() {
                    train.station_from = field(record, STATION_FROM);
                }
                if train.station_to.is_none() {
                    train.station_to = field(record, STATION_TO);
                }
                if train.running_days.is_none() {
                    train.running_days = field(record, RUNNING_DAYS);
                }
                train.stops.push(stop);
            }
            None => {
                index.insert(train_number.clone(), batch.trains.len());
                batch.trains.push(NormalizedTrain {
                    train_name: field(record, TRAIN_NAME),
                    station_from: field(record, STATION_FROM),
                    station_to: field(record, STATION_TO),
                    running_days: field(record, RUNNING_DAYS),
                    train_number,
                    stops: vec![stop],
                });
            }
        }
    }

    batch
}
