//! Churn dataset schema: column names, categorical vocabularies and the
//! typed prediction record.
//!
//! The spellings here are the ones used in the training CSV. The prediction
//! record serializes to exactly these names so encoders fitted at training
//! time apply unchanged at prediction time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::dataset::{FeatureRow, FeatureValue};

pub const ID_COLUMN: &str = "customerID";
pub const TARGET: &str = "Churn";
pub const POSITIVE_LABEL: &str = "Yes";
pub const NEGATIVE_LABEL: &str = "No";

pub const TENURE: &str = "tenure";
pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const TOTAL_CHARGES: &str = "TotalCharges";
pub const PHONE_SERVICE: &str = "PhoneService";
pub const CONTRACT: &str = "Contract";
pub const PAPERLESS_BILLING: &str = "PaperlessBilling";
pub const PAYMENT_METHOD: &str = "PaymentMethod";

pub const NUMERIC_FEATURES: [&str; 3] = [TENURE, MONTHLY_CHARGES, TOTAL_CHARGES];
pub const CATEGORICAL_FEATURES: [&str; 4] =
    [PHONE_SERVICE, CONTRACT, PAPERLESS_BILLING, PAYMENT_METHOD];

/// Implements the string conversions shared by every vocabulary enum.
macro_rules! vocabulary {
    ($name:ident, $label:expr, { $($variant:ident => $text:expr),+ $(,)? }) => {
        impl $name {
            /// Every value, in form display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Spelling used in the training data
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("Unknown {}: '{}'. Expected one of: {}", $label, s, allowed.join(", "))
                    })
            }
        }
    };
}

/// Yes/No answer used by PhoneService and PaperlessBilling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

vocabulary!(YesNo, "yes/no value", { Yes => "Yes", No => "No" });

/// Contract term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contract {
    #[serde(rename = "Month-to-month")]
    MonthToMonth,
    #[serde(rename = "One year")]
    OneYear,
    #[serde(rename = "Two year")]
    TwoYear,
}

vocabulary!(Contract, "contract", {
    MonthToMonth => "Month-to-month",
    OneYear => "One year",
    TwoYear => "Two year",
});

/// Billing payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Electronic check")]
    ElectronicCheck,
    #[serde(rename = "Mailed check")]
    MailedCheck,
    #[serde(rename = "Bank transfer (automatic)")]
    BankTransfer,
    #[serde(rename = "Credit card (automatic)")]
    CreditCard,
}

vocabulary!(PaymentMethod, "payment method", {
    ElectronicCheck => "Electronic check",
    MailedCheck => "Mailed check",
    BankTransfer => "Bank transfer (automatic)",
    CreditCard => "Credit card (automatic)",
});

/// One customer to score. Field names serialize to the training column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Months with the company
    pub tenure: u32,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    #[serde(rename = "PhoneService")]
    pub phone_service: YesNo,
    #[serde(rename = "Contract")]
    pub contract: Contract,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: YesNo,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: PaymentMethod,
}

impl Default for CustomerRecord {
    /// Matches the initial state of the input form
    fn default() -> Self {
        Self {
            tenure: 0,
            monthly_charges: 0.0,
            total_charges: 0.0,
            phone_service: YesNo::Yes,
            contract: Contract::MonthToMonth,
            paperless_billing: YesNo::Yes,
            payment_method: PaymentMethod::ElectronicCheck,
        }
    }
}

impl CustomerRecord {
    /// Build the single-row feature map keyed by training column names.
    pub fn to_feature_row(&self) -> FeatureRow {
        let mut row = FeatureRow::new();
        row.insert(TENURE.to_string(), FeatureValue::Number(f64::from(self.tenure)));
        row.insert(
            MONTHLY_CHARGES.to_string(),
            FeatureValue::Number(self.monthly_charges),
        );
        row.insert(
            TOTAL_CHARGES.to_string(),
            FeatureValue::Number(self.total_charges),
        );
        row.insert(
            PHONE_SERVICE.to_string(),
            FeatureValue::Text(self.phone_service.as_str().to_string()),
        );
        row.insert(
            CONTRACT.to_string(),
            FeatureValue::Text(self.contract.as_str().to_string()),
        );
        row.insert(
            PAPERLESS_BILLING.to_string(),
            FeatureValue::Text(self.paperless_billing.as_str().to_string()),
        );
        row.insert(
            PAYMENT_METHOD.to_string(),
            FeatureValue::Text(self.payment_method.as_str().to_string()),
        );
        row
    }
}
