use crate::domain::model::{Point, PointRecord, PointsFormat};
use crate::utils::error::{MapError, Result};

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Guesses the field delimiter from the first non-blank line.
/// Comma, semicolon and tab win over plain spaces.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");

    CANDIDATE_DELIMITERS
        .iter()
        .map(|&d| (d, first_line.bytes().filter(|&b| b == d).count()))
        .filter(|&(_, count)| count > 0)
        .max_by_key(|&(_, count)| count)
        .map(|(d, _)| d)
        .unwrap_or(b' ')
}

/// Parses an uploaded point file into records, in file order.
///
/// Blank lines are skipped and empty fields (repeated whitespace) dropped.
/// Every coordinate must parse as a finite number; anything else is reported
/// with its line number instead of being coerced.
pub fn parse_points(data: &[u8], format: PointsFormat) -> Result<Vec<PointRecord>> {
    let text = std::str::from_utf8(data)
        .map_err(|e| MapError::invalid_input(format!("point file is not valid UTF-8: {}", e)))?;
    let text = text.trim_start_matches('\u{feff}');

    let delimiter = sniff_delimiter(text);
    tracing::debug!("Using delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut resolved: Option<PointsFormat> = None;
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let fields: Vec<&str> = row.iter().map(str::trim).filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }

        let format = match resolved {
            Some(format) => format,
            None => {
                let format = resolve_format(format, &fields);
                tracing::debug!("Points format resolved to {:?}", format);
                resolved = Some(format);
                format
            }
        };

        records.push(parse_row(&fields, format, line)?);
    }

    Ok(records)
}

fn resolve_format(requested: PointsFormat, first_row: &[&str]) -> PointsFormat {
    if requested != PointsFormat::Auto {
        return requested;
    }

    let has_id = first_row
        .first()
        .map(|f| f.parse::<f64>().is_err())
        .unwrap_or(false);
    let numeric = first_row.len() - usize::from(has_id);

    match (has_id, numeric >= 4) {
        (true, true) => PointsFormat::IdXyxy,
        (true, false) => PointsFormat::IdXy,
        (false, true) => PointsFormat::Xyxy,
        (false, false) => PointsFormat::Xy,
    }
}

fn parse_row(fields: &[&str], format: PointsFormat, line: u64) -> Result<PointRecord> {
    if fields.len() < format.min_fields() {
        return Err(MapError::invalid_input(format!(
            "line {}: expected at least {} fields for {:?}, found {}",
            line,
            format.min_fields(),
            format,
            fields.len()
        )));
    }

    let (id, coords) = if format.has_id() {
        (Some(fields[0].to_string()), &fields[1..])
    } else {
        (None, fields)
    };

    let source = parse_pair(coords[0], coords[1], line)?;
    let target = if format.has_target() {
        Some(parse_pair(coords[2], coords[3], line)?)
    } else {
        None
    };

    Ok(PointRecord { id, source, target })
}

fn parse_pair(x: &str, y: &str, line: u64) -> Result<Point> {
    Ok(Point {
        x: parse_number(x, line)?,
        y: parse_number(y, line)?,
    })
}

fn parse_number(field: &str, line: u64) -> Result<f64> {
    let value: f64 = field.parse().map_err(|_| {
        MapError::invalid_input(format!("line {}: '{}' is not a number", line, field))
    })?;
    if !value.is_finite() {
        return Err(MapError::invalid_input(format!(
            "line {}: '{}' is not a finite number",
            line, field
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("1,2,3,4\n"), b',');
        assert_eq!(sniff_delimiter("\n\n1;2;3;4\n"), b';');
        assert_eq!(sniff_delimiter("1\t2\t3\t4"), b'\t');
        assert_eq!(sniff_delimiter("1   2  3 4"), b' ');
        assert_eq!(sniff_delimiter(""), b' ');
    }

    #[test]
    fn test_parse_space_separated_with_ids() {
        let data = b"P1   476000.12  4205000.50  1000.0 2000.0\n\nP2 476100.0 4205100.0 1100.0 2100.0\n";
        let records = parse_points(data, PointsFormat::Auto).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("P1"));
        assert_eq!(records[0].source, coord! { x: 476000.12, y: 4205000.50 });
        assert_eq!(records[0].target, Some(coord! { x: 1000.0, y: 2000.0 }));
        assert_eq!(records[1].id.as_deref(), Some("P2"));
    }

    #[test]
    fn test_parse_semicolon_xy() {
        let data = b"476000;4205000\n476100 ; 4205100\n";
        let records = parse_points(data, PointsFormat::Auto).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.id.is_none() && r.target.is_none()));
        assert_eq!(records[1].source, coord! { x: 476100.0, y: 4205100.0 });
    }

    #[test]
    fn test_parse_tab_separated_explicit_format() {
        let data = b"1\t2\t3\t4\n5\t6\t7\t8\n";
        let records = parse_points(data, PointsFormat::Xy).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].source, coord! { x: 5.0, y: 6.0 });
        assert!(records[1].target.is_none());
    }

    #[test]
    fn test_numeric_first_column_with_explicit_id_format() {
        let data = b"17,476000,4205000\n";
        let records = parse_points(data, PointsFormat::IdXy).unwrap();
        assert_eq!(records[0].id.as_deref(), Some("17"));
        assert_eq!(records[0].source, coord! { x: 476000.0, y: 4205000.0 });
    }

    #[test]
    fn test_auto_reads_numeric_id_as_coordinate() {
        let data = b"1 476000 4205000 100 200\n";
        let records = parse_points(data, PointsFormat::Auto).unwrap();
        assert_eq!(records[0].id, None);
        assert_eq!(records[0].source, coord! { x: 1.0, y: 476000.0 });

        let records = parse_points(data, PointsFormat::IdXyxy).unwrap();
        assert_eq!(records[0].source, coord! { x: 476000.0, y: 4205000.0 });
    }

    #[test]
    fn test_malformed_number_is_reported_with_line() {
        let data = b"1,2\n3,abc\n";
        let err = parse_points(data, PointsFormat::Auto).unwrap_err();
        assert!(matches!(err, MapError::InvalidInput { .. }));
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn test_nan_literal_is_rejected() {
        let err = parse_points(b"NaN-point,NaN,1\n", PointsFormat::IdXy).unwrap_err();
        assert!(err.to_string().contains("finite"), "{}", err);
    }

    #[test]
    fn test_short_row_is_rejected() {
        let data = b"A,1,2,3,4\nB,1,2\n";
        let err = parse_points(data, PointsFormat::Auto).unwrap_err();
        assert!(err.to_string().contains("expected at least 5 fields"), "{}", err);
    }

    #[test]
    fn test_empty_file_yields_no_records() {
        assert!(parse_points(b"\n  \n", PointsFormat::Auto).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(parse_points(&[0xff, 0xfe, 0x00], PointsFormat::Auto).is_err());
    }
}
