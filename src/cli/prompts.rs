//! Interactive prompts using dialoguer

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::pipeline::schema::{Contract, CustomerRecord, PaymentMethod, YesNo};

fn select_from<T: Copy + PartialEq + std::fmt::Display>(
    theme: &ColorfulTheme,
    prompt: &str,
    options: &[T],
    current: T,
) -> Result<T> {
    let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    let default = options.iter().position(|o| *o == current).unwrap_or(0);
    let idx = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(options[idx])
}

fn amount_input(theme: &ColorfulTheme, prompt: &str, initial: f64) -> Result<f64> {
    let value = Input::<f64>::with_theme(theme)
        .with_prompt(prompt)
        .default(initial)
        .validate_with(|v: &f64| -> Result<(), &str> {
            if v.is_finite() && *v >= 0.0 {
                Ok(())
            } else {
                Err("Enter an amount of 0 or more")
            }
        })
        .interact_text()?;
    Ok(value)
}

/// Ask for every field of a customer record, starting from `initial`
pub fn prompt_customer_record(initial: &CustomerRecord) -> Result<CustomerRecord> {
    let theme = ColorfulTheme::default();

    let tenure = Input::<u32>::with_theme(&theme)
        .with_prompt("Tenure (months)")
        .default(initial.tenure)
        .interact_text()?;
    let monthly_charges = amount_input(&theme, "Monthly Charges", initial.monthly_charges)?;
    let total_charges = amount_input(&theme, "Total Charges", initial.total_charges)?;
    let phone_service = select_from(&theme, "Phone Service", YesNo::ALL, initial.phone_service)?;
    let contract = select_from(&theme, "Contract", Contract::ALL, initial.contract)?;
    let paperless_billing =
        select_from(&theme, "Paperless Billing", YesNo::ALL, initial.paperless_billing)?;
    let payment_method =
        select_from(&theme, "Payment Method", PaymentMethod::ALL, initial.payment_method)?;

    Ok(CustomerRecord {
        tenure,
        monthly_charges,
        total_charges,
        phone_service,
        contract,
        paperless_billing,
        payment_method,
    })
}

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

pub fn confirm_predict_another() -> Result<bool> {
    confirm_step("Predict another customer?")
}
