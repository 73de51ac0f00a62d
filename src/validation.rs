//! Checks applied to user input before it reaches the [`crate::db::Store`],
//! which trusts whatever it is given.

use chrono::{Local, NaiveDate};
use thiserror::Error;

/// Word that has to be typed to wipe the whole database.
pub const RESET_CONFIRMATION: &str = "удалить";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Введите сумму транзакции.")]
    EmptyAmount,
    #[error("Сумма должна быть числом (например, 123.45).")]
    AmountNotNumber,
    #[error("Сумма не может быть нулевой.")]
    ZeroAmount,
    #[error("Введите положительную сумму.")]
    NegativeAmount,
    #[error("Введите имя категории")]
    EmptyCategoryName,
    #[error("Дата должна быть в формате ГГГГ-ММ-ДД.")]
    BadDate,
    #[error("Неправильное подтверждение. Операция отменена.")]
    ResetNotConfirmed,
}

/// Parses an amount typed by a user. A decimal comma is accepted.
pub fn parse_amount(input: &str) -> Result<f64, FormError> {
    let s = input.trim().replace(',', ".");
    if s.is_empty() {
        return Err(FormError::EmptyAmount);
    }
    let amount: f64 = s.parse().map_err(|_| FormError::AmountNotNumber)?;
    if !amount.is_finite() {
        return Err(FormError::AmountNotNumber);
    }
    if amount == 0.0 {
        return Err(FormError::ZeroAmount);
    }
    if amount < 0.0 {
        return Err(FormError::NegativeAmount);
    }
    Ok(amount)
}

pub fn category_name(input: &str) -> Result<&str, FormError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(FormError::EmptyCategoryName);
    }
    Ok(name)
}

/// Blank means today.
pub fn parse_date(input: Option<&str>) -> Result<NaiveDate, FormError> {
    match input.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(Local::now().date_naive()),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| FormError::BadDate),
    }
}

pub fn confirm_reset(input: &str) -> Result<(), FormError> {
    if input.trim().to_lowercase() == RESET_CONFIRMATION {
        Ok(())
    } else {
        Err(FormError::ResetNotConfirmed)
    }
}

/// Empty notes are stored as absent.
pub fn note(input: Option<String>) -> Option<String> {
    input.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_comma_and_whitespace() {
        assert_eq!(parse_amount(" 123.45 "), Ok(123.45));
        assert_eq!(parse_amount("12,5"), Ok(12.5));
        assert_eq!(parse_amount("7"), Ok(7.0));
    }

    #[test]
    fn amount_rejections() {
        assert_eq!(parse_amount("   "), Err(FormError::EmptyAmount));
        assert_eq!(parse_amount("abc"), Err(FormError::AmountNotNumber));
        assert_eq!(parse_amount("1.2.3"), Err(FormError::AmountNotNumber));
        assert_eq!(parse_amount("inf"), Err(FormError::AmountNotNumber));
        assert_eq!(parse_amount("NaN"), Err(FormError::AmountNotNumber));
        assert_eq!(parse_amount("0,00"), Err(FormError::ZeroAmount));
        assert_eq!(parse_amount("-5"), Err(FormError::NegativeAmount));
    }

    #[test]
    fn category_name_is_trimmed() {
        assert_eq!(category_name("  Еда "), Ok("Еда"));
        assert_eq!(category_name(" \t"), Err(FormError::EmptyCategoryName));
    }

    #[test]
    fn blank_date_means_today() {
        assert_eq!(parse_date(None), Ok(Local::now().date_naive()));
        assert_eq!(parse_date(Some("  ")), Ok(Local::now().date_naive()));
        assert_eq!(
            parse_date(Some("2024-02-29")),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(parse_date(Some("29.02.2024")), Err(FormError::BadDate));
    }

    #[test]
    fn reset_needs_the_word() {
        assert_eq!(confirm_reset(" УДАЛИТЬ "), Ok(()));
        assert_eq!(confirm_reset("да"), Err(FormError::ResetNotConfirmed));
    }

    #[test]
    fn blank_note_dropped() {
        assert_eq!(note(Some("  ".to_string())), None);
        assert_eq!(note(Some("обед".to_string())), Some("обед".to_string()));
    }
}
