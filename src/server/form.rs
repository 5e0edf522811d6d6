//! HTML prediction form: rendering and field parsing

use std::collections::HashMap;

use crate::pipeline::schema::{
    Contract, CustomerRecord, PaymentMethod, YesNo, CONTRACT, MONTHLY_CHARGES, PAPERLESS_BILLING,
    PAYMENT_METHOD, PHONE_SERVICE, TENURE, TOTAL_CHARGES,
};
use crate::pipeline::Prediction;

pub const CHURN_MESSAGE: &str = "Customer is likely to churn";
pub const NO_CHURN_MESSAGE: &str = "Customer is NOT likely to churn";

/// The single message shown under the form
#[derive(Debug, Clone, PartialEq)]
pub enum FormMessage {
    Predicted(Prediction),
    Invalid(Vec<String>),
    Failed(String),
}

impl FormMessage {
    /// CSS class and text of the message
    fn parts(&self) -> (&'static str, String) {
        match self {
            FormMessage::Predicted(p) if p.churn => ("error", CHURN_MESSAGE.to_string()),
            FormMessage::Predicted(_) => ("success", NO_CHURN_MESSAGE.to_string()),
            FormMessage::Invalid(errors) => ("warning", errors.join("; ")),
            FormMessage::Failed(reason) => ("error", format!("Prediction failed: {}", reason)),
        }
    }
}

/// Raw field values, echoed back into the form after a submit
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    fields: HashMap<String, String>,
}

impl FormValues {
    pub fn from_fields(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Parse every field into a record, collecting all field errors.
    pub fn to_record(&self) -> Result<CustomerRecord, Vec<String>> {
        let mut errors = Vec::new();

        let tenure = self.required(TENURE, &mut errors).and_then(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| errors.push(format!("{} must be a whole number of months (0 or more)", TENURE)))
                .ok()
        });
        let monthly_charges = self.amount(MONTHLY_CHARGES, &mut errors);
        let total_charges = self.amount(TOTAL_CHARGES, &mut errors);
        let phone_service = self.choice::<YesNo>(PHONE_SERVICE, &mut errors);
        let contract = self.choice::<Contract>(CONTRACT, &mut errors);
        let paperless_billing = self.choice::<YesNo>(PAPERLESS_BILLING, &mut errors);
        let payment_method = self.choice::<PaymentMethod>(PAYMENT_METHOD, &mut errors);

        match (
            tenure,
            monthly_charges,
            total_charges,
            phone_service,
            contract,
            paperless_billing,
            payment_method,
        ) {
            (Some(tenure), Some(mc), Some(tc), Some(ps), Some(c), Some(pb), Some(pm))
                if errors.is_empty() =>
            {
                Ok(CustomerRecord {
                    tenure,
                    monthly_charges: mc,
                    total_charges: tc,
                    phone_service: ps,
                    contract: c,
                    paperless_billing: pb,
                    payment_method: pm,
                })
            }
            _ => Err(errors),
        }
    }

    fn required<'a>(&'a self, name: &str, errors: &mut Vec<String>) -> Option<&'a str> {
        match self.get(name) {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                errors.push(format!("{} is required", name));
                None
            }
        }
    }

    fn amount(&self, name: &str, errors: &mut Vec<String>) -> Option<f64> {
        let raw = self.required(name, errors)?;
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
            _ => {
                errors.push(format!("{} must be a number of 0 or more", name));
                None
            }
        }
    }

    fn choice<T: std::str::FromStr<Err = String>>(
        &self,
        name: &str,
        errors: &mut Vec<String>,
    ) -> Option<T> {
        let raw = self.required(name, errors)?;
        raw.parse::<T>().map_err(|e| errors.push(e)).ok()
    }
}

impl From<&CustomerRecord> for FormValues {
    fn from(record: &CustomerRecord) -> Self {
        let fields = [
            (TENURE, record.tenure.to_string()),
            (MONTHLY_CHARGES, format!("{:.2}", record.monthly_charges)),
            (TOTAL_CHARGES, format!("{:.2}", record.total_charges)),
            (PHONE_SERVICE, record.phone_service.to_string()),
            (CONTRACT, record.contract.to_string()),
            (PAPERLESS_BILLING, record.paperless_billing.to_string()),
            (PAYMENT_METHOD, record.payment_method.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { fields }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:560px;margin:2rem auto;color:#222}\
label{display:block;margin-top:.8rem;font-weight:600}\
input,select{width:100%;padding:.4rem;margin-top:.2rem}\
button{margin-top:1.2rem;padding:.6rem 1.2rem}\
.message{margin-top:1.2rem;padding:.8rem;border-radius:4px}\
.error{background:#fde2e1;color:#8a1c17}\
.success{background:#e1f5e4;color:#1d6b2c}\
.warning{background:#fff4d6;color:#7a5b00}\
footer{margin-top:2rem;font-size:.8rem;color:#888}";

fn number_input(out: &mut String, name: &str, label: &str, step: &str, value: Option<&str>) {
    out.push_str(&format!(
        "<label for=\"{name}\">{label}</label>\
         <input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"0\" step=\"{step}\" value=\"{value}\" required>",
        name = escape_html(name),
        label = escape_html(label),
        step = step,
        value = escape_html(value.unwrap_or("0")),
    ));
}

fn select_input(out: &mut String, name: &str, label: &str, options: &[&str], selected: Option<&str>) {
    out.push_str(&format!(
        "<label for=\"{name}\">{label}</label><select id=\"{name}\" name=\"{name}\">",
        name = escape_html(name),
        label = escape_html(label),
    ));
    for option in options {
        let is_selected = selected.map_or(false, |s| s.eq_ignore_ascii_case(option));
        out.push_str(&format!(
            "<option value=\"{v}\"{sel}>{v}</option>",
            v = escape_html(option),
            sel = if is_selected { " selected" } else { "" },
        ));
    }
    out.push_str("</select>");
}

/// Render the whole page. `message` adds exactly one message block.
pub fn render_page(values: &FormValues, message: Option<&FormMessage>, algorithm: &str) -> String {
    let yes_no: Vec<&str> = YesNo::ALL.iter().map(|v| v.as_str()).collect();
    let contracts: Vec<&str> = Contract::ALL.iter().map(|v| v.as_str()).collect();
    let methods: Vec<&str> = PaymentMethod::ALL.iter().map(|v| v.as_str()).collect();

    let mut page = String::new();
    page.push_str(&format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Customer Churn Predictor</title><style>{}</style></head><body>\
         <h1>Customer Churn Predictor</h1>\
         <p>Enter the customer's account details to predict whether they will churn.</p>\
         <form method=\"post\" action=\"/predict\">",
        STYLE
    ));

    number_input(&mut page, TENURE, "Tenure (months)", "1", values.get(TENURE));
    number_input(&mut page, MONTHLY_CHARGES, "Monthly Charges", "0.01", values.get(MONTHLY_CHARGES));
    number_input(&mut page, TOTAL_CHARGES, "Total Charges", "0.01", values.get(TOTAL_CHARGES));
    select_input(&mut page, PHONE_SERVICE, "Phone Service", &yes_no, values.get(PHONE_SERVICE));
    select_input(&mut page, CONTRACT, "Contract", &contracts, values.get(CONTRACT));
    select_input(
        &mut page,
        PAPERLESS_BILLING,
        "Paperless Billing",
        &yes_no,
        values.get(PAPERLESS_BILLING),
    );
    select_input(&mut page, PAYMENT_METHOD, "Payment Method", &methods, values.get(PAYMENT_METHOD));
    page.push_str("<button type=\"submit\">Predict Churn</button></form>");

    if let Some(message) = message {
        let (class, text) = message.parts();
        page.push_str(&format!(
            "<div class=\"message {}\" role=\"status\">{}</div>",
            class,
            escape_html(&text)
        ));
    }

    page.push_str(&format!(
        "<footer>Model: {}</footer></body></html>",
        escape_html(algorithm)
    ));
    page
}
