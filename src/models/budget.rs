//! Budget allocation and breakdown

use serde::{Deserialize, Serialize};

use crate::{Result, TripPlannerError};

/// Currency prefix used in prompts, emails and reports
pub const CURRENCY: &str = "Rs.";

/// Share of the total budget given to each spending category, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetAllocation {
    pub accommodation_pct: u8,
    pub transport_pct: u8,
    pub food_pct: u8,
    pub activities_pct: u8,
}

impl Default for BudgetAllocation {
    fn default() -> Self {
        Self {
            accommodation_pct: 40,
            transport_pct: 25,
            food_pct: 20,
            activities_pct: 15,
        }
    }
}

impl BudgetAllocation {
    /// Sum of all explicit shares; whatever is left goes to miscellaneous
    #[must_use]
    pub fn allocated_pct(&self) -> u32 {
        u32::from(self.accommodation_pct)
            + u32::from(self.transport_pct)
            + u32::from(self.food_pct)
            + u32::from(self.activities_pct)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allocated_pct() > 100 {
            return Err(TripPlannerError::validation(format!(
                "Budget allocation adds up to {}%, it cannot exceed 100%.",
                self.allocated_pct()
            )));
        }
        Ok(())
    }
}

/// A single budget line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLine {
    pub category: &'static str,
    pub amount: u64,
}

/// Total budget split by category; the lines always sum to `total`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetBreakdown {
    pub total: u64,
    pub lines: Vec<BudgetLine>,
}

impl BudgetBreakdown {
    #[must_use]
    pub fn new(total: u64, allocation: &BudgetAllocation) -> Self {
        // widened so budgets near u64::MAX cannot overflow
        let share = |pct: u8| {
            let amount = u128::from(total) * u128::from(pct) / 100;
            u64::try_from(amount).unwrap_or(u64::MAX)
        };

        let accommodation = share(allocation.accommodation_pct);
        let transport = share(allocation.transport_pct);
        let food = share(allocation.food_pct);
        let activities = share(allocation.activities_pct);
        let allocated = [accommodation, transport, food, activities]
            .into_iter()
            .fold(0u64, u64::saturating_add);
        let miscellaneous = total.saturating_sub(allocated);

        Self {
            total,
            lines: vec![
                BudgetLine { category: "Transportation", amount: transport },
                BudgetLine { category: "Accommodation", amount: accommodation },
                BudgetLine { category: "Food & Dining", amount: food },
                BudgetLine { category: "Activities", amount: activities },
                BudgetLine { category: "Miscellaneous", amount: miscellaneous },
            ],
        }
    }

    #[must_use]
    pub fn amount_for(&self, category: &str) -> Option<u64> {
        self.lines
            .iter()
            .find(|line| line.category == category)
            .map(|line| line.amount)
    }
}

/// Group digits in thousands: `50000` becomes `50,000`
#[must_use]
pub fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Format an amount with the currency prefix: `Rs. 50,000`
#[must_use]
pub fn format_rupees(amount: u64) -> String {
    format!("{CURRENCY} {}", group_thousands(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(1000, "1,000")]
    #[case(50000, "50,000")]
    #[case(1234567, "1,234,567")]
    fn test_group_thousands(#[case] amount: u64, #[case] expected: &str) {
        assert_eq!(group_thousands(amount), expected);
    }

    #[test]
    fn test_default_breakdown() {
        let breakdown = BudgetBreakdown::new(50000, &BudgetAllocation::default());
        assert_eq!(breakdown.amount_for("Accommodation"), Some(20000));
        assert_eq!(breakdown.amount_for("Transportation"), Some(12500));
        assert_eq!(breakdown.amount_for("Food & Dining"), Some(10000));
        assert_eq!(breakdown.amount_for("Activities"), Some(7500));
        assert_eq!(breakdown.amount_for("Miscellaneous"), Some(0));
    }

    #[test]
    fn test_breakdown_always_sums_to_total() {
        let allocation = BudgetAllocation {
            accommodation_pct: 33,
            transport_pct: 33,
            food_pct: 17,
            activities_pct: 7,
        };
        let breakdown = BudgetBreakdown::new(99_999, &allocation);
        let sum: u64 = breakdown.lines.iter().map(|line| line.amount).sum();
        assert_eq!(sum, 99_999);
        assert!(breakdown.amount_for("Miscellaneous").unwrap() > 0);
    }

    #[test]
    fn test_huge_budget_does_not_overflow() {
        let total = u64::MAX - 7;
        let breakdown = BudgetBreakdown::new(total, &BudgetAllocation::default());
        let sum: u128 = breakdown.lines.iter().map(|line| u128::from(line.amount)).sum();
        assert_eq!(sum, u128::from(total));
        assert_eq!(
            breakdown.amount_for("Accommodation"),
            Some(u64::try_from(u128::from(total) * 40 / 100).unwrap())
        );
    }

    #[test]
    fn test_unvalidated_over_allocation_saturates() {
        let allocation = BudgetAllocation {
            accommodation_pct: 255,
            transport_pct: 255,
            food_pct: 255,
            activities_pct: 255,
        };
        let breakdown = BudgetBreakdown::new(u64::MAX, &allocation);
        assert_eq!(breakdown.amount_for("Accommodation"), Some(u64::MAX));
        assert_eq!(breakdown.amount_for("Miscellaneous"), Some(0));
    }

    #[test]
    fn test_over_allocation_rejected() {
        let allocation = BudgetAllocation {
            accommodation_pct: 60,
            transport_pct: 30,
            food_pct: 20,
            activities_pct: 0,
        };
        let err = allocation.validate().unwrap_err();
        assert!(err.user_message().contains("110%"));
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(200000), "Rs. 200,000");
    }
}
