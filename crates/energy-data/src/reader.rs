//! CSV file detection and loading for Energy Monitor.
//!
//! Three file shapes are recognised from the file name:
//!
//! * `{house}_both_daily.csv`: `date,electricity,gas`, one house.
//! * `{fuel}_daily.csv`: `date,<house>,<house>,...`, one fuel.
//! * `suppliers.csv`: `Data Type,<house>,...` followed by five tariff rows.
//!
//! Every check runs before anything is returned, so a rejected file never
//! yields partial data.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use csv::{ReaderBuilder, StringRecord};
use energy_core::error::{EnergyError, Result};
use energy_core::models::{DatasetKind, EntityKey, FileKind, FuelType};
use energy_core::tariffs::{Tariff, TariffTable, TARIFF_ROWS};
use energy_core::time_utils::parse_date_token;
use regex::Regex;
use tracing::{debug, warn};

use crate::store::{Dataset, DatedSeries};

/// The result of loading one file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedFile {
    Usage(Dataset),
    Tariffs(TariffTable),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decide what a file holds from its name alone.
///
/// Only the part of the base name before the first `.` is inspected.
pub fn detect_file_kind(path: &Path) -> Result<FileKind> {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = base.split('.').next().unwrap_or_default();

    let (single, multi, suppliers) = filename_patterns();

    if let Some(caps) = single.captures(stem) {
        let house_id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        return Ok(FileKind::Usage(DatasetKind::SingleHouse {
            house_id: house_id.to_string(),
        }));
    }
    if let Some(caps) = multi.captures(stem) {
        let fuel: FuelType = caps.get(1).map(|m| m.as_str()).unwrap_or_default().parse()?;
        return Ok(FileKind::Usage(DatasetKind::MultiHouse { fuel }));
    }
    if suppliers.is_match(stem) {
        return Ok(FileKind::Tariffs);
    }

    Err(EnergyError::format(format!(
        "File name '{}' must be one of {{fuel-type}}_daily.csv, {{house-id}}_both_daily.csv or suppliers.csv",
        base
    )))
}

/// Open, classify and fully validate one file.
pub fn load_file(path: &Path) -> Result<LoadedFile> {
    let file = std::fs::File::open(path).map_err(|e| EnergyError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let result = detect_file_kind(path).and_then(|kind| match kind {
        FileKind::Usage(kind) => parse_usage(file, kind).map(LoadedFile::Usage),
        FileKind::Tariffs => parse_tariffs(file).map(LoadedFile::Tariffs),
    });

    match &result {
        Ok(LoadedFile::Usage(ds)) => debug!(
            path = %path.display(),
            rows = ds.days(),
            entities = ds.entities.len(),
            "parsed usage file"
        ),
        Ok(LoadedFile::Tariffs(table)) => debug!(
            path = %path.display(),
            entities = table.len(),
            "parsed tariff file"
        ),
        Err(e) => warn!(path = %path.display(), error = %e, "rejected file"),
    }

    result
}

/// Parse a usage CSV of the given shape.
pub fn parse_usage<R: Read>(input: R, kind: DatasetKind) -> Result<Dataset> {
    let mut records = csv_records(input);

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| EnergyError::format("File is empty"))?;

    let entities = usage_entities(&header, &kind)?;
    let mut daily = DatedSeries::new();

    for (index, record) in records.enumerate() {
        let record = record?;
        let row = index + 1;
        if record.len() != header.len() {
            return Err(EnergyError::format(format!(
                "Row {} contains {} values, expected {}",
                row,
                record.len(),
                header.len()
            )));
        }

        let date = parse_date_token(&record[0])?;

        let mut values = BTreeMap::new();
        for (entity, token) in entities.iter().zip(record.iter().skip(1)) {
            values.insert(entity.clone(), parse_number(token)?);
        }
        daily.push(date, kind.series_from(&values))?;
    }

    if daily.is_empty() {
        return Err(EnergyError::format("File contains no data rows"));
    }

    Ok(Dataset::new(kind, entities, daily))
}

/// Parse a `Data Type` tariff CSV.
pub fn parse_tariffs<R: Read>(input: R) -> Result<TariffTable> {
    let mut records = csv_records(input);

    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| EnergyError::format("File is empty"))?;

    if !header
        .get(0)
        .is_some_and(|h| h.trim().eq_ignore_ascii_case("data type"))
    {
        return Err(EnergyError::format("First heading should be 'Data Type'"));
    }
    let entities = header_names(&header);
    if entities.is_empty() {
        return Err(EnergyError::format("Tariff file names no entities"));
    }
    check_unique(&entities)?;

    let mut details: Vec<BTreeMap<String, String>> = vec![BTreeMap::new(); entities.len()];
    let mut rates: Vec<BTreeMap<String, f64>> = vec![BTreeMap::new(); entities.len()];
    let mut count = 0usize;

    for record in records {
        let record = record?;
        count += 1;
        if record.len() != header.len() {
            return Err(EnergyError::format(format!(
                "Row {} contains wrong number of values",
                count
            )));
        }
        let label = record[0].trim().to_string();
        for (i, token) in record.iter().skip(1).enumerate() {
            if count == 1 {
                details[i].insert(label.clone(), token.to_string());
            } else {
                rates[i].insert(label.clone(), parse_number(token)?);
            }
        }
    }

    if count != TARIFF_ROWS {
        return Err(EnergyError::format(format!(
            "File should contain header plus {} rows of data, found {}",
            TARIFF_ROWS, count
        )));
    }

    let mut table = TariffTable::new();
    for ((entity, details), rates) in entities.into_iter().zip(details).zip(rates) {
        let tariff = Tariff::from_rows(&entity, details, rates)?;
        table.insert(entity, tariff);
    }
    Ok(table)
}

/// Strict numeric check: ASCII digits with at most one decimal point and at
/// least one digit. Signs, exponents and separators are rejected.
pub fn is_numeric_token(token: &str) -> bool {
    let mut digits = 0usize;
    let mut points = 0usize;
    for c in token.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn filename_patterns() -> &'static (Regex, Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"^(.*?)_both_daily").expect("regex is valid"),
            Regex::new(r"^(gas|electricity)_daily").expect("regex is valid"),
            Regex::new(r"suppliers").expect("regex is valid"),
        )
    })
}

fn csv_records<R: Read>(input: R) -> impl Iterator<Item = Result<StringRecord>> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
        .into_records()
        .map(|r| r.map_err(|e| EnergyError::format(format!("Malformed CSV: {}", e))))
}

/// Validate a usage header and return its entity keys in column order.
fn usage_entities(header: &StringRecord, kind: &DatasetKind) -> Result<Vec<EntityKey>> {
    let first_is_date = header
        .get(0)
        .is_some_and(|h| h.trim().eq_ignore_ascii_case("date"));

    match kind {
        DatasetKind::SingleHouse { .. } => {
            let matches = header.len() == 3
                && first_is_date
                && header[1].trim().eq_ignore_ascii_case(FuelType::Electricity.as_str())
                && header[2].trim().eq_ignore_ascii_case(FuelType::Gas.as_str());
            if !matches {
                return Err(EnergyError::format(
                    "Header must be 'date,electricity,gas'",
                ));
            }
            Ok(FuelType::ALL.iter().map(|&f| f.into()).collect())
        }
        DatasetKind::MultiHouse { .. } => {
            if !first_is_date {
                return Err(EnergyError::format("First heading should be 'date'"));
            }
            let names = header_names(&header);
            if names.is_empty() {
                return Err(EnergyError::format("Header names no houses"));
            }
            check_unique(&names)?;
            Ok(names.into_iter().map(EntityKey::Named).collect())
        }
    }
}

/// Column names after the first heading. Only header cells are trimmed;
/// data cells reach the numeric check exactly as written.
fn header_names(header: &StringRecord) -> Vec<String> {
    header.iter().skip(1).map(|h| h.trim().to_string()).collect()
}

fn check_unique(names: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(EnergyError::format("Header contains an empty column name"));
        }
        if !seen.insert(name.as_str()) {
            return Err(EnergyError::format(format!(
                "Header repeats column '{}'",
                name
            )));
        }
    }
    Ok(())
}

fn parse_number(token: &str) -> Result<f64> {
    if !is_numeric_token(token) {
        return Err(EnergyError::parse(format!("Data not numeric: '{}'", token)));
    }
    token
        .parse()
        .map_err(|_| EnergyError::parse(format!("Data not numeric: '{}'", token)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use energy_core::error::ErrorKind;
    use energy_core::models::Series;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn single_kind() -> DatasetKind {
        DatasetKind::SingleHouse {
            house_id: "house_1".into(),
        }
    }

    fn multi_kind() -> DatasetKind {
        DatasetKind::MultiHouse {
            fuel: FuelType::Electricity,
        }
    }

    const SUPPLIERS: &[&str] = &[
        "Data Type,HouseA,HouseC",
        "Supplier,Octopus,EDF",
        "Electricity Standing Charge,500,450",
        "Electricity Usage Rate,14.2,30.55",
        "Gas Standing Charge,800,750",
        "Gas Usage Rate,4.5,3.1",
    ];

    // ── detect_file_kind ──────────────────────────────────────────────────────

    #[test]
    fn test_detect_single_house() {
        let kind = detect_file_kind(Path::new("/data/house_12_both_daily.csv")).unwrap();
        assert_eq!(
            kind,
            FileKind::Usage(DatasetKind::SingleHouse {
                house_id: "house_12".into()
            })
        );
    }

    #[test]
    fn test_detect_multi_house() {
        let kind = detect_file_kind(Path::new("gas_daily.csv")).unwrap();
        assert_eq!(
            kind,
            FileKind::Usage(DatasetKind::MultiHouse {
                fuel: FuelType::Gas
            })
        );
        let kind = detect_file_kind(Path::new("electricity_daily_partial.csv")).unwrap();
        assert_eq!(
            kind,
            FileKind::Usage(DatasetKind::MultiHouse {
                fuel: FuelType::Electricity
            })
        );
    }

    #[test]
    fn test_detect_suppliers() {
        assert_eq!(
            detect_file_kind(Path::new("suppliers.csv")).unwrap(),
            FileKind::Tariffs
        );
        assert_eq!(
            detect_file_kind(Path::new("suppliers_extrarows.csv")).unwrap(),
            FileKind::Tariffs
        );
    }

    #[test]
    fn test_detect_only_uses_text_before_first_dot() {
        let err = detect_file_kind(Path::new("readings.gas_daily.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_detect_unrecognised_name() {
        let err = detect_file_kind(Path::new("water_daily.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    // ── is_numeric_token ──────────────────────────────────────────────────────

    #[test]
    fn test_padded_usage_cell_is_parse_error() {
        let csv = "date,house_a\n20160101, 1\n";
        let err = parse_usage(csv.as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_padded_tariff_cell_is_parse_error() {
        let mut lines = SUPPLIERS.to_vec();
        lines[2] = "Electricity Standing Charge, 500 ,450";
        let err = parse_tariffs(lines.join("\n").as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_padded_header_names_are_trimmed() {
        let csv = "date, house_a ,house_b\n20160101,1,2\n";
        let ds = parse_usage(csv.as_bytes(), multi_kind()).unwrap();
        assert_eq!(
            ds.entities,
            vec![EntityKey::named("house_a"), EntityKey::named("house_b")]
        );
    }

    #[test]
    fn test_is_numeric_token() {
        assert!(is_numeric_token("20.93194302"));
        assert!(is_numeric_token("4"));
        assert!(is_numeric_token(".5"));
        assert!(is_numeric_token("5."));
        for bad in ["", ".", "-1", "+1", "1e5", "1,000", "1.2.3", "12a", " 1"] {
            assert!(!is_numeric_token(bad), "{bad:?} should be rejected");
        }
    }

    // ── parse_usage: single house ─────────────────────────────────────────────

    #[test]
    fn test_parse_single_house() {
        let csv = "date,electricity,gas\n20160101,20.93194302,4.063200168\n20160102,18.5,3.25\n";
        let ds = parse_usage(csv.as_bytes(), single_kind()).unwrap();
        assert_eq!(ds.days(), 2);
        assert_eq!(
            ds.daily.get(d(2016, 1, 1)),
            Some(&Series::Fixed {
                electricity: 20.93194302,
                gas: 4.063200168
            })
        );
        assert_eq!(ds.house_ids(), vec!["house_1"]);
    }

    #[test]
    fn test_parse_single_house_header_case_insensitive() {
        let csv = "Date,Electricity,GAS\n20160101,1,2\n";
        assert!(parse_usage(csv.as_bytes(), single_kind()).is_ok());
    }

    #[test]
    fn test_parse_single_house_wrong_header() {
        for header in ["date,gas,electricity", "date,electricity", "day,electricity,gas"] {
            let csv = format!("{header}\n20160101,1,2\n");
            let err = parse_usage(csv.as_bytes(), single_kind()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "header {header:?}");
        }
    }

    // ── parse_usage: multi house ──────────────────────────────────────────────

    #[test]
    fn test_parse_multi_house_keeps_header_order() {
        let csv = "date,house_b,house_a\n20160101,1.5,2.5\n20160102,3,4\n";
        let ds = parse_usage(csv.as_bytes(), multi_kind()).unwrap();
        assert_eq!(
            ds.entities,
            vec![EntityKey::named("house_b"), EntityKey::named("house_a")]
        );
        let day = ds.daily.get(d(2016, 1, 1)).unwrap();
        assert_eq!(day.get(&EntityKey::named("house_a")), Some(2.5));
        assert_eq!(day.get(&EntityKey::named("house_b")), Some(1.5));
    }

    #[test]
    fn test_parse_multi_house_row_width_mismatch() {
        let csv = "date,a,b\n20160101,1,2\n20160102,3\n";
        let err = parse_usage(csv.as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_parse_multi_house_requires_a_house() {
        let err = parse_usage("date\n20160101\n".as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_multi_house_duplicate_column() {
        let err = parse_usage("date,a,a\n20160101,1,2\n".as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    // ── parse_usage: cell validation ──────────────────────────────────────────

    #[test]
    fn test_parse_usage_non_numeric_value() {
        let csv = "date,a\n20160101,-1\n";
        let err = parse_usage(csv.as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_usage_bad_date_shape() {
        let csv = "date,a\n2016-01-01,1\n";
        let err = parse_usage(csv.as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_usage_impossible_date() {
        let csv = "date,a\n20150229,1\n";
        let err = parse_usage(csv.as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_usage_duplicate_date() {
        let csv = "date,a\n20160101,1\n20160101,2\n";
        let err = parse_usage(csv.as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_usage_empty_and_header_only() {
        let err = parse_usage("".as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = parse_usage("date,a\n".as_bytes(), multi_kind()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    // ── parse_tariffs ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_tariffs() {
        let csv = SUPPLIERS.join("\n");
        let table = parse_tariffs(csv.as_bytes()).unwrap();
        assert_eq!(table.entity_ids(), ["HouseA", "HouseC"]);
        let c = table.get("HouseC").unwrap();
        assert_eq!(c.electricity.usage_rate, 30.55);
        assert_eq!(c.gas.standing_charge, 750.0);
        assert_eq!(c.details["Supplier"], "EDF");
    }

    #[test]
    fn test_parse_tariffs_header_case_insensitive() {
        let mut lines = SUPPLIERS.to_vec();
        lines[0] = "data type,HouseA,HouseC";
        assert!(parse_tariffs(lines.join("\n").as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_tariffs_wrong_first_heading() {
        let mut lines = SUPPLIERS.to_vec();
        lines[0] = "Type,HouseA,HouseC";
        let err = parse_tariffs(lines.join("\n").as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_tariffs_extra_row() {
        let mut lines = SUPPLIERS.to_vec();
        lines.push("Exit Fee,30,0");
        let err = parse_tariffs(lines.join("\n").as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_tariffs_missing_row() {
        let lines = &SUPPLIERS[..5];
        let err = parse_tariffs(lines.join("\n").as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_tariffs_non_numeric_rate() {
        let mut lines = SUPPLIERS.to_vec();
        lines[3] = "Electricity Usage Rate,14.2,thirty";
        let err = parse_tariffs(lines.join("\n").as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_parse_tariffs_first_row_may_be_text() {
        let mut lines = SUPPLIERS.to_vec();
        lines[1] = "Supplier,British Gas,E.ON Next";
        assert!(parse_tariffs(lines.join("\n").as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_tariffs_missing_rate_label() {
        let mut lines = SUPPLIERS.to_vec();
        lines[5] = "Gas Rate,4.5,3.1";
        let err = parse_tariffs(lines.join("\n").as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    // ── load_file ─────────────────────────────────────────────────────────────

    #[test]
    fn test_load_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_file(&dir.path().join("gas_daily.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(err, EnergyError::FileRead { .. }));
    }

    #[test]
    fn test_load_file_dispatches_on_name() {
        let dir = TempDir::new().unwrap();
        let usage = write_csv(
            dir.path(),
            "HouseA_both_daily.csv",
            &["date,electricity,gas", "20160101,1,2"],
        );
        let suppliers = write_csv(dir.path(), "suppliers.csv", SUPPLIERS);

        match load_file(&usage).unwrap() {
            LoadedFile::Usage(ds) => assert_eq!(ds.house_ids(), vec!["HouseA"]),
            other => panic!("expected usage, got {other:?}"),
        }
        match load_file(&suppliers).unwrap() {
            LoadedFile::Tariffs(t) => assert_eq!(t.len(), 2),
            other => panic!("expected tariffs, got {other:?}"),
        }
    }

    #[test]
    fn test_load_file_unrecognised_name() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "readings.csv", &["date,a", "20160101,1"]);
        let err = load_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
