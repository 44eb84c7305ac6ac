//! Flat key/value records for persisting input quantities.
//!
//! A [`Record`] maps field names to numbers, strings or number lists and
//! serializes with serde as a plain map. Every record carries the common
//! fields `value`, `coverage`, `k`, `unit`, `type` and `distribution`, plus
//! `definition`/`description` when set. The remaining fields depend on the
//! distribution:
//!
//! | distribution | fields |
//! |---|---|
//! | `None` | `ustd` (if known) |
//! | `Normal` | `uexp` |
//! | `Rectangular`, `Triangular` | `hlim`, `a`, `b` |
//! | `Trapezoidal` | `hlim`, `a`, `b`, `d` |
//! | `StudentT` | `uexp`, `df` |
//! | `Direct Observation` | `observations`, `method`, `unc_eval` |
//!
//! The limits `a`/`b` and the `type` tag are derived and ignored on input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coverage::CoverageSpec;
use crate::distributions::{Normal, Rectangular, StudentT, Trapezoidal, Triangular, Unspecified};
use crate::error::{Result, UncertaintyError};
use crate::observations::DirectObservations;
use crate::uncertainty::{Distribution, DistributionKind, Uncertainty, DEFAULT_UNIT};

/// A single record field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Numbers(Vec<f64>),
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Number(x)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(xs: Vec<f64>) -> Self {
        Self::Numbers(xs)
    }
}

/// Field map of one input quantity, ordered by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn number(&self, field: &str) -> Result<f64> {
        self.opt_number(field)?
            .ok_or_else(|| UncertaintyError::invalid_record(field, "missing"))
    }

    fn opt_number(&self, field: &str) -> Result<Option<f64>> {
        match self.get(field) {
            None => Ok(None),
            Some(FieldValue::Number(x)) => Ok(Some(*x)),
            Some(_) => Err(UncertaintyError::invalid_record(field, "expected a number")),
        }
    }

    fn opt_text(&self, field: &str) -> Result<Option<&str>> {
        match self.get(field) {
            None => Ok(None),
            Some(FieldValue::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(UncertaintyError::invalid_record(field, "expected a string")),
        }
    }

    fn text(&self, field: &str) -> Result<&str> {
        self.opt_text(field)?
            .ok_or_else(|| UncertaintyError::invalid_record(field, "missing"))
    }

    fn numbers(&self, field: &str) -> Result<&[f64]> {
        match self.get(field) {
            None => Err(UncertaintyError::invalid_record(field, "missing")),
            Some(FieldValue::Numbers(xs)) => Ok(xs),
            Some(_) => Err(UncertaintyError::invalid_record(field, "expected a list of numbers")),
        }
    }
}

impl Uncertainty {
    /// Flattens this quantity into a [`Record`]. A cached sample set is not
    /// persisted.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("value", self.value());
        record.insert("coverage", self.coverage().coverage());
        record.insert("k", self.k());
        record.insert("unit", self.unit());
        if let Some(definition) = self.definition() {
            record.insert("definition", definition);
        }
        if let Some(description) = self.description() {
            record.insert("description", description);
        }
        record.insert("type", self.classification().as_str());
        record.insert("distribution", self.kind().as_str());

        if let Some((a, b)) = self.limits() {
            record.insert("a", a);
            record.insert("b", b);
        }
        match self.distribution() {
            Distribution::None(u) => {
                if let Some(ustd) = u.standard_uncertainty() {
                    record.insert("ustd", ustd);
                }
            }
            Distribution::Normal(n) => record.insert("uexp", n.uexp()),
            Distribution::Rectangular(r) => record.insert("hlim", r.hlim()),
            Distribution::Triangular(t) => record.insert("hlim", t.hlim()),
            Distribution::Trapezoidal(t) => {
                record.insert("hlim", t.hlim());
                record.insert("d", t.d());
            }
            Distribution::StudentT(t) => {
                record.insert("uexp", t.uexp());
                record.insert("df", t.df());
            }
            Distribution::DirectObservations(o) => {
                record.insert("observations", o.observations().to_vec());
                record.insert("method", o.method());
                record.insert("unc_eval", o.unc_eval());
            }
        }
        record
    }

    /// Rebuilds a quantity from a [`Record`].
    ///
    /// Coverage is resolved from the optional `coverage` and `k` fields; with
    /// neither present the default coverage applies.
    ///
    /// # Errors
    /// - `UnknownDistributionKind` for an unrecognized `distribution` tag.
    /// - `InvalidRecord` for a missing or mistyped field.
    /// - `InvalidCoverage` or a distribution error for bad parameter values.
    pub fn from_record(record: &Record) -> Result<Self> {
        let kind: DistributionKind = record.text("distribution")?.parse()?;
        let coverage = CoverageSpec::resolve(record.opt_number("coverage")?, record.opt_number("k")?)?;

        let with_value = |distribution: Distribution| -> Result<Uncertainty> {
            Uncertainty::from_distribution(record.number("value")?, distribution, coverage)
        };
        let mut quantity = match kind {
            DistributionKind::None => {
                with_value(Distribution::None(Unspecified::new(record.opt_number("ustd")?)?))?
            }
            DistributionKind::Normal => with_value(Distribution::Normal(Normal::new(record.number("uexp")?)?))?,
            DistributionKind::Rectangular => {
                with_value(Distribution::Rectangular(Rectangular::new(record.number("hlim")?)?))?
            }
            DistributionKind::Triangular => {
                with_value(Distribution::Triangular(Triangular::new(record.number("hlim")?)?))?
            }
            DistributionKind::Trapezoidal => with_value(Distribution::Trapezoidal(Trapezoidal::new(
                record.number("hlim")?,
                record.number("d")?,
            )?))?,
            DistributionKind::StudentT => with_value(Distribution::StudentT(StudentT::new(
                record.number("uexp")?,
                record.number("df")?,
            )?))?,
            DistributionKind::DirectObservations => {
                let mut obs = DirectObservations::new(record.numbers("observations")?)?;
                if let Some(method) = record.opt_text("method")? {
                    obs = obs.with_method(method);
                }
                if let Some(unc_eval) = record.opt_text("unc_eval")? {
                    obs = obs.with_unc_eval(unc_eval);
                }
                Uncertainty::direct_observations(obs, coverage)?
            }
        };

        quantity = quantity.with_unit(record.opt_text("unit")?.unwrap_or(DEFAULT_UNIT));
        quantity.set_definition(record.opt_text("definition")?.map(str::to_string));
        quantity.set_description(record.opt_text("description")?.map(str::to_string));
        Ok(quantity)
    }
}

// ============================================================================
// Tests
// ============================================================================
