use ratatui::text::Line;

use crate::error::LedgerError;
use crate::models::{NewCustomer, PaymentReceipt};

use super::helpers::field_line;

/// Whether `ch` may appear in a numeric field while the user is typing.
fn is_numeric_input(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.' || ch == '-'
}

fn parse_number(raw: &str, label: &str) -> Result<f64, LedgerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LedgerError::Invalid(format!("{label} is required.")));
    }
    raw.parse::<f64>()
        .map_err(|_| LedgerError::Invalid(format!("{label} must be a number.")))
}

/// Internal representation of the "add customer" form fields.
#[derive(Default, Clone)]
pub(crate) struct CustomerForm {
    pub(crate) name: String,
    pub(crate) balance: String,
    pub(crate) debt: String,
    pub(crate) active: CustomerField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum CustomerField {
    #[default]
    Name,
    Balance,
    Debt,
}

impl CustomerField {
    /// Row of the field inside the form popup.
    pub(crate) fn row(self) -> u16 {
        match self {
            CustomerField::Name => 0,
            CustomerField::Balance => 1,
            CustomerField::Debt => 2,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            CustomerField::Name => "Name",
            CustomerField::Balance => "Balance",
            CustomerField::Debt => "Debt",
        }
    }
}

impl CustomerForm {
    /// Cycle focus across the three fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            CustomerField::Name => CustomerField::Balance,
            CustomerField::Balance => CustomerField::Debt,
            CustomerField::Debt => CustomerField::Name,
        };
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            CustomerField::Name if !ch.is_control() => self.name.push(ch),
            CustomerField::Balance if is_numeric_input(ch) => self.balance.push(ch),
            CustomerField::Debt if is_numeric_input(ch) => self.debt.push(ch),
            _ => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Validate the inputs and return a customer ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<NewCustomer, LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Invalid("Customer name is required.".to_string()));
        }
        let balance = parse_number(&self.balance, "Balance")?;
        let debt = parse_number(&self.debt, "Debt")?;
        NewCustomer::new(&self.name, balance, debt)
    }

    pub(crate) fn build_line(&self, field: CustomerField) -> Line<'static> {
        field_line(field.label(), self.value(field), self.active == field)
    }

    /// Column of the cursor for the active field, relative to the popup.
    pub(crate) fn cursor_column(&self) -> u16 {
        let field = self.active;
        (field.label().len() + 2 + self.value(field).chars().count()) as u16
    }

    fn value(&self, field: CustomerField) -> &str {
        match field {
            CustomerField::Name => &self.name,
            CustomerField::Balance => &self.balance,
            CustomerField::Debt => &self.debt,
        }
    }

    fn value_mut(&mut self, field: CustomerField) -> &mut String {
        match field {
            CustomerField::Name => &mut self.name,
            CustomerField::Balance => &mut self.balance,
            CustomerField::Debt => &mut self.debt,
        }
    }
}

/// Form state for applying a payment.
#[derive(Default, Clone)]
pub(crate) struct PaymentForm {
    pub(crate) customer_id: String,
    pub(crate) amount: String,
    pub(crate) active: PaymentField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum PaymentField {
    #[default]
    CustomerId,
    Amount,
}

impl PaymentField {
    pub(crate) fn row(self) -> u16 {
        match self {
            PaymentField::CustomerId => 0,
            PaymentField::Amount => 1,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            PaymentField::CustomerId => "Customer ID",
            PaymentField::Amount => "Amount",
        }
    }
}

impl PaymentForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            PaymentField::CustomerId => PaymentField::Amount,
            PaymentField::Amount => PaymentField::CustomerId,
        };
    }

    /// Ids only take digits; the amount also takes a sign and decimal point
    /// so that invalid amounts reach the payment processor and get reported.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            PaymentField::CustomerId if ch.is_ascii_digit() => self.customer_id.push(ch),
            PaymentField::Amount if is_numeric_input(ch) => self.amount.push(ch),
            _ => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            PaymentField::CustomerId => {
                self.customer_id.pop();
            }
            PaymentField::Amount => {
                self.amount.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<(i64, f64), LedgerError> {
        let raw_id = self.customer_id.trim();
        if raw_id.is_empty() {
            return Err(LedgerError::Invalid("Customer ID is required.".to_string()));
        }
        let id = raw_id
            .parse::<i64>()
            .map_err(|_| LedgerError::Invalid("Customer ID must be an integer.".to_string()))?;
        let amount = parse_number(&self.amount, "Amount")?;
        Ok((id, amount))
    }

    pub(crate) fn build_line(&self, field: PaymentField) -> Line<'static> {
        field_line(field.label(), self.value(field), self.active == field)
    }

    pub(crate) fn cursor_column(&self) -> u16 {
        let field = self.active;
        (field.label().len() + 2 + self.value(field).chars().count()) as u16
    }

    fn value(&self, field: PaymentField) -> &str {
        match field {
            PaymentField::CustomerId => &self.customer_id,
            PaymentField::Amount => &self.amount,
        }
    }
}

/// Result popup shown after a payment attempt.
#[derive(Clone)]
pub(crate) enum PaymentOutcome {
    Applied(PaymentReceipt),
    Refused(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(form: &mut CustomerForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn customer_form_builds_a_new_customer() {
        let mut form = CustomerForm::default();
        type_into(&mut form, " Ana ");
        form.toggle_field();
        type_into(&mut form, "100.5");
        form.toggle_field();
        type_into(&mut form, "50");

        let customer = form.parse_inputs().unwrap();
        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.balance, 100.5);
        assert_eq!(customer.debt, 50.0);
    }

    #[test]
    fn numeric_fields_drop_letters() {
        let mut form = CustomerForm::default();
        form.toggle_field();
        assert!(!form.push_char('x'));
        assert!(form.push_char('7'));
        assert_eq!(form.balance, "7");
    }

    #[test]
    fn customer_form_requires_every_field() {
        let mut form = CustomerForm::default();
        assert!(form.parse_inputs().is_err());
        type_into(&mut form, "Ana");
        let err = form.parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Balance is required.");
    }

    #[test]
    fn payment_form_parses_id_and_amount() {
        let mut form = PaymentForm::default();
        for ch in "12".chars() {
            form.push_char(ch);
        }
        form.toggle_field();
        for ch in "30.25".chars() {
            form.push_char(ch);
        }
        assert_eq!(form.parse_inputs().unwrap(), (12, 30.25));
    }

    #[test]
    fn payment_form_rejects_garbled_amount() {
        let mut form = PaymentForm::default();
        form.push_char('1');
        form.toggle_field();
        for ch in "1.2.3".chars() {
            form.push_char(ch);
        }
        assert!(form.parse_inputs().is_err());
    }
}
