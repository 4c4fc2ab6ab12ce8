//! Product characteristics and the filter facets built from them.
//!
//! Each product carries an ordered list of characteristic values. The catalog
//! filter panel needs the opposite view: for a whole category subtree, which
//! characteristics exist and what values they take. [`aggregate_facets`]
//! folds the former into the latter.

use serde::{Deserialize, Serialize};

use crate::collation;

/// A typed characteristic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AttributeValue {
    String { value: String },
    Number { value: f64 },
    Boolean { value: bool },
    Range { min: f64, max: f64 },
}

/// One characteristic of one product, e.g. "Power: 5.5 kW".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub value: AttributeValue,
}

/// Values a facet offers to the filter panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FacetValues {
    /// Distinct string values in Russian alphabetical order.
    Options { options: Vec<String> },
    /// Numeric span covering every number and range seen.
    Range { min: f64, max: f64 },
    /// Which boolean values occur.
    Boolean { has_true: bool, has_false: bool },
}

/// A filterable characteristic across a set of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeFacet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub values: FacetValues,
}

impl AttributeFacet {
    fn from_first(attribute: &ProductAttribute) -> Option<Self> {
        let values = match &attribute.value {
            AttributeValue::String { value } => FacetValues::Options {
                options: vec![value.trim().to_string()],
            },
            AttributeValue::Number { value } if value.is_finite() => FacetValues::Range {
                min: *value,
                max: *value,
            },
            AttributeValue::Range { min, max } if min.is_finite() && max.is_finite() => {
                FacetValues::Range {
                    min: min.min(*max),
                    max: max.max(*min),
                }
            }
            AttributeValue::Boolean { value } => FacetValues::Boolean {
                has_true: *value,
                has_false: !*value,
            },
            AttributeValue::Number { .. } | AttributeValue::Range { .. } => return None,
        };

        Some(Self {
            name: attribute.name.trim().to_string(),
            unit: attribute.unit.clone(),
            values,
        })
    }

    /// Fold another value in. Values of a different kind than the facet's
    /// first value are ignored.
    fn absorb(&mut self, value: &AttributeValue) {
        match (&mut self.values, value) {
            (FacetValues::Options { options }, AttributeValue::String { value }) => {
                let value = value.trim();
                if !options.iter().any(|existing| existing == value) {
                    options.push(value.to_string());
                }
            }
            (FacetValues::Range { min, max }, AttributeValue::Number { value })
                if value.is_finite() =>
            {
                *min = min.min(*value);
                *max = max.max(*value);
            }
            (FacetValues::Range { min, max }, AttributeValue::Range { min: lo, max: hi })
                if lo.is_finite() && hi.is_finite() =>
            {
                *min = min.min(lo.min(*hi));
                *max = max.max(hi.max(*lo));
            }
            (FacetValues::Boolean { has_true, has_false }, AttributeValue::Boolean { value }) => {
                if *value {
                    *has_true = true;
                } else {
                    *has_false = true;
                }
            }
            _ => {}
        }
    }
}

/// Aggregate product characteristics into facets.
///
/// Facets keep the order in which characteristic names first appear; string
/// options are de-duplicated and sorted alphabetically.
pub fn aggregate_facets<'a>(
    attributes: impl IntoIterator<Item = &'a ProductAttribute>,
) -> Vec<AttributeFacet> {
    let mut facets: Vec<AttributeFacet> = Vec::new();

    for attribute in attributes {
        let name = attribute.name.trim();
        if name.is_empty() {
            continue;
        }
        match facets.iter_mut().find(|facet| facet.name == name) {
            Some(facet) => facet.absorb(&attribute.value),
            None => facets.extend(AttributeFacet::from_first(attribute)),
        }
    }

    for facet in &mut facets {
        if let FacetValues::Options { options } = &mut facet.values {
            options.sort_by(|a, b| collation::compare(a, b));
        }
    }

    facets
}
