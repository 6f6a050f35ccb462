//! # What is Arran?
//!
//! Arran applies instrument-level percentage tilts to strategy weight tables. A weight table
//! holds one row per client classification with a percentage weight for each investable
//! instrument, every row summing to 100. Given a set of deltas (for example, "+10% to Equity,
//! -5% to Gold", typically produced upstream by a market-conditions process), Arran adjusts
//! each instrument's weight relative to its current value and renormalizes every row so the
//! allocation sums to 100 again.
//!
//! The standard mechanism for running a tilt is the `arran_apply` binary, which reads a
//! strategy CSV and a deltas JSON file and writes the renormalized CSV. Users can also import
//! the lib, which is intended primarily for testing and for embedding the transform in other
//! Rust applications.
//!
//! # Implementation
//!
//! A single tilt run is composed of:
//! - A table, [WeightTable](crate::types::WeightTable), built through
//!   [WeightTableBuilder](crate::types::WeightTableBuilder) either in code or from a CSV
//!   source. The table preserves instrument column order end to end.
//! - A delta spec, [DeltaSpec](crate::types::DeltaSpec), mapping instrument names to
//!   percentage deltas. Deltas are relative adjustments, not absolute point changes: a delta
//!   of +10 on a weight of 50 moves it to 55 before renormalization.
//! - The normalizer, [apply_deltas](crate::normalize::apply_deltas), a pure single-pass
//!   transform that validates the delta spec against the table before touching any row and
//!   either produces a complete output table or fails with a typed error. There is no partial
//!   output.
//!
//! The [source](crate::source) module holds the CSV/JSON boundary. It is deliberately thin:
//! reading validates that every weight cell parses as a non-negative number, writing emits the
//! renormalized columns under a `_final` suffix. Everything between read and write operates on
//! in-memory tables with no I/O.
//!
//! ``
//! cargo run --bin arran_apply [strategy_csv] [deltas_json] [output_csv]
//! ``
pub mod normalize;
pub mod source;
pub mod types;
