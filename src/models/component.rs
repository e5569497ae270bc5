//! Income component types and component-keyed amounts.
//!
//! Amounts keyed by component are always modeled as a mapping from the closed
//! [`IncomeComponentType`] set to a decimal, where an absent key means zero.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The closed set of income components the engine understands.
///
/// # Example
///
/// ```
/// use income_engine::models::IncomeComponentType;
///
/// let component: IncomeComponentType = serde_json::from_str("\"OVERTIME\"").unwrap();
/// assert_eq!(component, IncomeComponentType::Overtime);
/// assert!(component.is_variable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeComponentType {
    /// Base pay (salary or hourly wages).
    Base,
    /// Overtime pay.
    Overtime,
    /// Bonus pay.
    Bonus,
    /// Commission pay.
    Commission,
    /// Shift differential pay.
    ShiftDiff,
    /// Tips.
    Tips,
    /// Any other income.
    Other,
}

impl IncomeComponentType {
    /// Every component, in canonical order.
    pub const ALL: [IncomeComponentType; 7] = [
        IncomeComponentType::Base,
        IncomeComponentType::Overtime,
        IncomeComponentType::Bonus,
        IncomeComponentType::Commission,
        IncomeComponentType::ShiftDiff,
        IncomeComponentType::Tips,
        IncomeComponentType::Other,
    ];

    /// Components that must be trended against prior-year history.
    pub const VARIABLE: [IncomeComponentType; 3] = [
        IncomeComponentType::Overtime,
        IncomeComponentType::Bonus,
        IncomeComponentType::Commission,
    ];

    /// Returns true for overtime, bonus and commission.
    pub fn is_variable(self) -> bool {
        Self::VARIABLE.contains(&self)
    }

    /// Returns the wire name of the component (e.g. `"SHIFT_DIFF"`).
    pub fn as_str(self) -> &'static str {
        match self {
            IncomeComponentType::Base => "BASE",
            IncomeComponentType::Overtime => "OVERTIME",
            IncomeComponentType::Bonus => "BONUS",
            IncomeComponentType::Commission => "COMMISSION",
            IncomeComponentType::ShiftDiff => "SHIFT_DIFF",
            IncomeComponentType::Tips => "TIPS",
            IncomeComponentType::Other => "OTHER",
        }
    }

    /// Parses a wire name back into a component.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for IncomeComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amounts keyed by income component.
///
/// Missing components read as zero. Iteration order follows the component
/// declaration order, which keeps serialized output stable.
///
/// # Example
///
/// ```
/// use income_engine::models::{ComponentAmounts, IncomeComponentType};
/// use rust_decimal::Decimal;
///
/// let mut amounts = ComponentAmounts::new();
/// amounts.add(IncomeComponentType::Base, Decimal::new(700000, 2));
/// amounts.add(IncomeComponentType::Base, Decimal::new(50000, 2));
///
/// assert_eq!(amounts.get(IncomeComponentType::Base), Decimal::new(750000, 2));
/// assert_eq!(amounts.get(IncomeComponentType::Bonus), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentAmounts(BTreeMap<IncomeComponentType, Decimal>);

impl ComponentAmounts {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the amount for a component, or zero when absent.
    pub fn get(&self, component: IncomeComponentType) -> Decimal {
        self.0.get(&component).copied().unwrap_or(Decimal::ZERO)
    }

    /// Returns true if the component has an explicit entry.
    pub fn contains(&self, component: IncomeComponentType) -> bool {
        self.0.contains_key(&component)
    }

    /// Sets the amount for a component, replacing any previous value.
    pub fn set(&mut self, component: IncomeComponentType, amount: Decimal) {
        self.0.insert(component, amount);
    }

    /// Adds an amount onto a component's running total.
    pub fn add(&mut self, component: IncomeComponentType, amount: Decimal) {
        *self.0.entry(component).or_insert(Decimal::ZERO) += amount;
    }

    /// Sum of every component. An empty mapping totals `0.00`.
    pub fn total(&self) -> Decimal {
        self.0
            .values()
            .fold(Decimal::new(0, 2), |sum, amount| sum + amount)
    }

    /// Iterates over the explicit entries in component order.
    pub fn iter(&self) -> impl Iterator<Item = (IncomeComponentType, Decimal)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }

    /// Returns true if no component has an entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(IncomeComponentType, Decimal)> for ComponentAmounts {
    fn from_iter<T: IntoIterator<Item = (IncomeComponentType, Decimal)>>(iter: T) -> Self {
        let mut amounts = ComponentAmounts::new();
        for (component, amount) in iter {
            amounts.add(component, amount);
        }
        amounts
    }
}
