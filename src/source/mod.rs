//! Loads weight tables from CSV, delta specs from JSON, and writes renormalized tables back
//! out. Everything between read and write operates on in-memory [WeightTable] values.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};
use std::path::Path;

use log::info;

use crate::types::{DeltaSpec, WeightRow, WeightTable, WeightTableBuilder};

///Suffix appended to instrument column names on output, marking the weights as renormalized.
pub const FINAL_SUFFIX: &str = "_final";

///Input CSV could not be turned into a valid weight table.
#[derive(Debug)]
pub enum ReadError {
    ///Underlying CSV parse or I/O failure.
    Csv(csv::Error),
    ///Header row present but no data rows. The normalizer contract requires a non-empty table.
    Empty,
    ///Header has the category column only, so there is nothing to tilt.
    NoInstrumentColumns,
    ///Weight cell did not parse as a non-negative number. Row numbers are 1-based data rows,
    ///matching what a user sees in the file below the header.
    MalformedWeight {
        row: usize,
        column: String,
        value: String,
    },
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ReadError::Csv(err) => write!(f, "CSV error: {err}"),
            ReadError::Empty => write!(f, "Table has a header but no data rows"),
            ReadError::NoInstrumentColumns => {
                write!(f, "Table has no instrument columns after the category column")
            }
            ReadError::MalformedWeight { row, column, value } => {
                write!(
                    f,
                    "Row {row} holds non-numeric or negative weight {value:?} in column {column}"
                )
            }
        }
    }
}

impl From<csv::Error> for ReadError {
    fn from(err: csv::Error) -> Self {
        ReadError::Csv(err)
    }
}

///Reads a weight table from CSV. The first header column is the category identifier and is
///passed through untouched; every remaining column is an instrument whose cells must parse as
///non-negative numbers. Column order is preserved.
pub fn read_weight_table(reader: impl Read) -> Result<WeightTable, ReadError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(ReadError::NoInstrumentColumns);
    }

    let mut builder = WeightTableBuilder::new();
    builder.with_category_label(&headers[0]);
    let instruments: Vec<String> = headers.iter().skip(1).map(String::from).collect();
    for instrument in &instruments {
        builder.add_instrument(instrument);
    }

    let mut row_count = 0;
    for (row_num, record) in rdr.records().enumerate() {
        let record = record?;
        let mut row = WeightRow::new(&record[0]);
        for (instrument, cell) in instruments.iter().zip(record.iter().skip(1)) {
            let weight = match cell.trim().parse::<f64>() {
                Ok(parsed) if parsed >= 0.0 => parsed,
                _ => {
                    return Err(ReadError::MalformedWeight {
                        row: row_num + 1,
                        column: instrument.clone(),
                        value: cell.to_string(),
                    })
                }
            };
            row.insert(instrument, weight);
        }
        builder.add_row(row);
        row_count += 1;
    }

    if row_count == 0 {
        return Err(ReadError::Empty);
    }

    info!(
        "SOURCE: Read {} rows across {} instrument columns",
        row_count,
        instruments.len()
    );
    //Every record filled every instrument column above
    Ok(builder.build().unwrap())
}

pub fn read_weight_table_from_path(path: impl AsRef<Path>) -> Result<WeightTable, ReadError> {
    let file = std::fs::File::open(path.as_ref()).map_err(csv::Error::from)?;
    read_weight_table(file)
}

///Writes a weight table as CSV: the category column under its original header, then one
///`<instrument>_final` column per instrument in table order. Weights are written with full
///float precision, display rounding is the consumer's concern.
pub fn write_weight_table(writer: impl Write, table: &WeightTable) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = vec![table.category_label().to_string()];
    for instrument in table.instruments() {
        header.push(format!("{instrument}{FINAL_SUFFIX}"));
    }
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut record: Vec<String> = vec![row.category.clone()];
        for instrument in table.instruments() {
            //Built tables hold a weight for every instrument column
            record.push(row.get(instrument).unwrap().to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;

    info!("SOURCE: Wrote {} rows", table.rows().len());
    Ok(())
}

pub fn write_weight_table_to_path(
    path: impl AsRef<Path>,
    table: &WeightTable,
) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path.as_ref()).map_err(csv::Error::from)?;
    write_weight_table(file, table)
}

///Reads a delta spec from a JSON object of instrument name to percentage delta, the shape the
///upstream market-conditions process emits, for example `{"Equity": 10.0, "Gold": -5.0}`.
pub fn read_delta_spec(reader: impl Read) -> Result<DeltaSpec, serde_json::Error> {
    serde_json::from_reader(reader)
}

pub fn read_delta_spec_from_path(path: impl AsRef<Path>) -> anyhow::Result<DeltaSpec> {
    let file = std::fs::File::open(path.as_ref())?;
    Ok(read_delta_spec(file)?)
}

#[cfg(test)]
mod tests {
    use super::{read_delta_spec, read_weight_table, write_weight_table, ReadError};
    use crate::types::DeltaSpec;

    const STRATEGY_CSV: &str = "\
Client Type,Equity,Debt,Gold
Conservative,20,70,10
Standard,50,40,10
Aggressive,75,20,5
";

    #[test]
    fn reads_category_label_and_instrument_order() {
        let table = read_weight_table(STRATEGY_CSV.as_bytes()).unwrap();
        assert_eq!(table.category_label(), "Client Type");
        assert_eq!(table.instruments(), &["Equity", "Debt", "Gold"]);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[1].category, "Standard");
        assert_eq!(**table.rows()[1].get("Debt").unwrap(), 40.0);
    }

    #[test]
    fn non_numeric_weight_is_malformed() {
        let csv = "Client Type,Equity,Debt\nStandard,fifty,50\n";
        let res = read_weight_table(csv.as_bytes());
        match res {
            Err(ReadError::MalformedWeight { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "Equity");
                assert_eq!(value, "fifty");
            }
            _ => panic!("Expected MalformedWeight error"),
        }
    }

    #[test]
    fn negative_weight_is_malformed() {
        let csv = "Client Type,Equity,Debt\nStandard,-10,110\n";
        let res = read_weight_table(csv.as_bytes());
        assert!(matches!(
            res,
            Err(ReadError::MalformedWeight { row: 1, .. })
        ));
    }

    #[test]
    fn header_only_table_is_empty() {
        let csv = "Client Type,Equity,Debt\n";
        assert!(matches!(
            read_weight_table(csv.as_bytes()),
            Err(ReadError::Empty)
        ));
    }

    #[test]
    fn category_only_header_has_no_instruments() {
        let csv = "Client Type\nStandard\n";
        assert!(matches!(
            read_weight_table(csv.as_bytes()),
            Err(ReadError::NoInstrumentColumns)
        ));
    }

    #[test]
    fn writes_final_suffix_columns_in_order() {
        let table = read_weight_table(STRATEGY_CSV.as_bytes()).unwrap();
        let mut out: Vec<u8> = Vec::new();
        write_weight_table(&mut out, &table).unwrap();

        let written = String::from_utf8(out).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Client Type,Equity_final,Debt_final,Gold_final"
        );
        assert_eq!(lines.next().unwrap(), "Conservative,20,70,10");
    }

    #[test]
    fn delta_spec_loads_from_json_object() {
        let json = r#"{"Equity": 10.0, "Gold": -5.5}"#;
        let deltas: DeltaSpec = read_delta_spec(json.as_bytes()).unwrap();
        assert_eq!(*deltas.get("Equity").unwrap(), 10.0);
        assert_eq!(*deltas.get("Gold").unwrap(), -5.5);
        assert!(deltas.get("Debt").is_none());
    }
}
