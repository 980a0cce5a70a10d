use bigdecimal::BigDecimal;
use std::fmt;

pub const NAME_MAX_LEN: usize = 120;
pub const DOCUMENT_NUMBER_MAX_LEN: usize = 32;
pub const AGENCY_MAX_LEN: usize = 16;
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 32;
pub const DESCRIPTION_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_digits(field: &'static str, value: &str) -> ValidationResult {
    if !value.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::new(field, "must contain only digits"));
    }

    Ok(())
}

pub fn validate_name(name: &str) -> ValidationResult {
    validate_required("name", name)?;
    validate_max_len("name", name, NAME_MAX_LEN)?;

    Ok(())
}

pub fn validate_document_number(document_number: &str) -> ValidationResult {
    validate_required("document_number", document_number)?;
    validate_max_len("document_number", document_number, DOCUMENT_NUMBER_MAX_LEN)?;
    validate_digits("document_number", document_number)?;

    Ok(())
}

pub fn validate_agency(agency: &str) -> ValidationResult {
    validate_required("agency", agency)?;
    validate_max_len("agency", agency, AGENCY_MAX_LEN)?;

    Ok(())
}

pub fn validate_account_number(number: &str) -> ValidationResult {
    validate_required("number", number)?;
    validate_max_len("number", number, ACCOUNT_NUMBER_MAX_LEN)?;

    Ok(())
}

pub fn validate_description(description: &str) -> ValidationResult {
    validate_max_len("description", description, DESCRIPTION_MAX_LEN)
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}
