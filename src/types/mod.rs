//! Generic types used across package

use std::collections::HashMap;
use std::ops::Deref;

use itertools::Itertools;
use rand::thread_rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

///Size of an instrument's allocation within a row in percentage terms. Weights are stored as
///percentage points so a fully allocated row sums to 100.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Weight(f64);

impl Deref for Weight {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self(0.0)
    }
}

impl From<Weight> for f64 {
    fn from(v: Weight) -> Self {
        v.0
    }
}

impl From<f64> for Weight {
    fn from(v: f64) -> Self {
        Weight(v)
    }
}

///Single row of a weight table: an opaque category identifier (for example, a client
///classification) and a weight for each instrument. The category is passed through every
///transform unchanged.
#[derive(Clone, Debug)]
pub struct WeightRow {
    pub category: String,
    weights: HashMap<String, Weight>,
}

impl WeightRow {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            weights: HashMap::new(),
        }
    }

    pub fn get(&self, instrument: impl AsRef<str>) -> Option<&Weight> {
        self.weights.get(instrument.as_ref())
    }

    pub fn insert(&mut self, instrument: impl AsRef<str>, value: impl Into<Weight>) {
        self.weights
            .insert(instrument.as_ref().to_string(), value.into());
    }
}

///Set of percentage deltas keyed by instrument name. A delta is a relative adjustment: a delta
///of +10 moves a weight of 50 to 55 before renormalization, not to 60.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DeltaSpec(HashMap<String, f64>);

impl DeltaSpec {
    pub fn get(&self, instrument: impl AsRef<str>) -> Option<&f64> {
        self.0.get(instrument.as_ref())
    }

    pub fn insert(&mut self, instrument: impl AsRef<str>, delta: f64) {
        self.0.insert(instrument.as_ref().to_string(), delta);
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect_vec()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn new() -> Self {
        let map: HashMap<String, f64> = HashMap::new();
        Self(map)
    }
}

///Ordered collection of weight rows sharing one set of instrument columns. Instrument order is
///preserved end to end so tables written back out keep the column order they were read with.
///
///Rows are assumed to sum to 100 on the way in; the source module checks that cells are
///non-negative numbers but the sum itself is the producer's contract.
#[derive(Clone, Debug)]
pub struct WeightTable {
    category_label: String,
    instruments: Vec<String>,
    rows: Vec<WeightRow>,
}

impl WeightTable {
    pub fn category_label(&self) -> &str {
        &self.category_label
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn rows(&self) -> &[WeightRow] {
        &self.rows
    }

    pub fn has_instrument(&self, instrument: &str) -> bool {
        self.instruments.iter().any(|name| name == instrument)
    }

    ///Generates a table of the given shape with uniform random weights renormalized to sum to
    ///100 per row. Used by benches and tests that need bulk fixtures.
    pub fn random(rows: usize, instruments: Vec<&str>) -> Self {
        let weight_dist = Uniform::new(1.0, 50.0);
        let mut rng = thread_rng();

        let mut builder = WeightTableBuilder::new();
        builder.with_category_label("Client Type");
        for instrument in &instruments {
            builder.add_instrument(*instrument);
        }

        for row_num in 0..rows {
            let raw: Vec<f64> = instruments
                .iter()
                .map(|_| weight_dist.sample(&mut rng))
                .collect();
            let total: f64 = raw.iter().sum();

            let mut row = WeightRow::new(format!("Client{row_num}"));
            for (instrument, weight) in instruments.iter().zip(raw) {
                row.insert(*instrument, weight / total * 100.0);
            }
            builder.add_row(row);
        }
        //Shape is valid by construction
        builder.build().unwrap()
    }
}

///Incrementally assembles a [WeightTable]. `build` fails if a row is missing a weight for a
///declared instrument, so a built table always has a value in every cell.
#[derive(Debug)]
pub struct WeightTableBuilder {
    category_label: String,
    instruments: Vec<String>,
    rows: Vec<WeightRow>,
}

///Builder was given a row without a weight for one of the declared instrument columns.
#[derive(Clone, Debug)]
pub struct IncompleteRowError {
    pub category: String,
    pub instrument: String,
}

impl std::error::Error for IncompleteRowError {}

impl std::fmt::Display for IncompleteRowError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Row {} has no weight for instrument {}",
            self.category, self.instrument
        )
    }
}

impl WeightTableBuilder {
    pub fn new() -> Self {
        Self {
            category_label: String::from("Category"),
            instruments: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_category_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.category_label = label.into();
        self
    }

    pub fn add_instrument(&mut self, instrument: impl Into<String>) -> &mut Self {
        self.instruments.push(instrument.into());
        self
    }

    pub fn add_row(&mut self, row: WeightRow) -> &mut Self {
        self.rows.push(row);
        self
    }

    pub fn build(self) -> Result<WeightTable, IncompleteRowError> {
        for row in &self.rows {
            for instrument in &self.instruments {
                if row.get(instrument).is_none() {
                    return Err(IncompleteRowError {
                        category: row.category.clone(),
                        instrument: instrument.clone(),
                    });
                }
            }
        }
        Ok(WeightTable {
            category_label: self.category_label,
            instruments: self.instruments,
            rows: self.rows,
        })
    }
}

impl Default for WeightTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
