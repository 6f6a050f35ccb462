//! Applies instrument deltas to a weight table and renormalizes each row back to 100.

use std::error::Error;
use std::fmt::{Display, Formatter};

use log::info;

use crate::types::{DeltaSpec, WeightRow, WeightTable, WeightTableBuilder};

///Tolerance used when comparing row totals. Weights are percentage points so anything below
///this is rounding noise.
pub const WEIGHT_EPSILON: f64 = 1e-6;

///Lowest legal delta. A delta of exactly -100 zeroes an instrument; anything below it would
///drive the adjusted weight negative before renormalization.
const DELTA_FLOOR: f64 = -100.0;

///Normalizer cannot produce a valid output table for the given inputs. All variants are raised
///before any output exists, there is no partial result to recover.
#[derive(Clone, Debug)]
pub enum NormalizeError {
    ///Delta spec references instruments that are not columns of the table. Holds every missing
    ///key so the caller sees the full mismatch at once.
    UnknownInstrument(Vec<String>),
    ///Delta below -100% would produce a negative weight. Rejected rather than clamped so the
    ///producer of the spec learns the input was out of range.
    DeltaBelowFloor { instrument: String, delta: f64 },
    ///Row's adjusted weights summed to zero, leaving no basis for renormalization.
    DegenerateRow { category: String },
}

impl Error for NormalizeError {}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            NormalizeError::UnknownInstrument(missing) => {
                write!(f, "Delta keys not found in table columns: {missing:?}")
            }
            NormalizeError::DeltaBelowFloor { instrument, delta } => {
                write!(
                    f,
                    "Delta {delta} for instrument {instrument} is below the -100% floor"
                )
            }
            NormalizeError::DegenerateRow { category } => {
                write!(
                    f,
                    "Adjusted weights for row {category} sum to zero, cannot renormalize"
                )
            }
        }
    }
}

///Checks every delta key against the table's instrument columns. Runs before any row is
///processed so a bad spec never produces partial output.
fn validate_deltas(table: &WeightTable, deltas: &DeltaSpec) -> Result<(), NormalizeError> {
    let missing: Vec<String> = deltas
        .keys()
        .into_iter()
        .filter(|key| !table.has_instrument(key))
        .collect();
    if !missing.is_empty() {
        return Err(NormalizeError::UnknownInstrument(missing));
    }

    for key in deltas.keys() {
        //Validated above so key always resolves
        let delta = *deltas.get(&key).unwrap();
        if delta < DELTA_FLOOR {
            return Err(NormalizeError::DeltaBelowFloor {
                instrument: key,
                delta,
            });
        }
    }
    Ok(())
}

///Applies deltas to a single row and rescales so the row sums to 100 again.
fn normalize_row(
    row: &WeightRow,
    instruments: &[String],
    deltas: &DeltaSpec,
) -> Result<WeightRow, NormalizeError> {
    let mut adjusted: Vec<f64> = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        //Build guarantees a weight for every instrument column
        let weight = **row.get(instrument).unwrap();
        if let Some(delta) = deltas.get(instrument) {
            adjusted.push(weight + (weight * delta / 100.0));
        } else {
            adjusted.push(weight);
        }
    }

    let total: f64 = adjusted.iter().sum();
    if total.abs() < WEIGHT_EPSILON {
        //Renormalizing a zero row cannot restore the sum-to-100 invariant so this is fatal
        //rather than a silent passthrough
        return Err(NormalizeError::DegenerateRow {
            category: row.category.clone(),
        });
    }

    let mut out = WeightRow::new(row.category.clone());
    for (instrument, weight) in instruments.iter().zip(adjusted) {
        out.insert(instrument, weight / total * 100.0);
    }
    Ok(out)
}

///Applies instrument-level deltas to every row of the table and renormalizes each row back to
///a total of 100. Deltas are relative: a delta of +10 scales the instrument's weight by 1.1
///before the row is rescaled.
///
///The input table is assumed to hold rows summing to 100. The transform preserves the category
///column, the instrument order and the row order; only the weights change.
///
///Validation is fail-fast: an unknown delta key or an out-of-range delta raises before any row
///is processed. A row whose adjusted weights sum to zero (every instrument zeroed, for example
///by a -100 delta on a single-instrument row) raises [NormalizeError::DegenerateRow] and the
///whole invocation fails, no partial table is returned.
pub fn apply_deltas(table: &WeightTable, deltas: &DeltaSpec) -> Result<WeightTable, NormalizeError> {
    validate_deltas(table, deltas)?;
    info!(
        "NORMALIZER: Applying {} deltas across {} rows",
        deltas.keys().len(),
        table.rows().len()
    );

    let mut builder = WeightTableBuilder::new();
    builder.with_category_label(table.category_label());
    for instrument in table.instruments() {
        builder.add_instrument(instrument);
    }

    for row in table.rows() {
        builder.add_row(normalize_row(row, table.instruments(), deltas)?);
    }

    //Output rows carry exactly the input's instrument set so build cannot fail
    Ok(builder.build().unwrap())
}
