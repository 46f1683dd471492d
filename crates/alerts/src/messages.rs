//! User-facing message texts (Spanish, like the bank's own publications).

use bcv_core::{round_value, weekday_name_of, Rate, RateChange};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub const START_MSG: &str = "¡Hola! Soy un bot diseñado para proveer las tasas de dólar del Banco Central de Venezuela.
Usa el comando /ayuda para conocer las opciones disponibles.

Proyecto no afiliado con el Banco Central de Venezuela.";

pub const HELP_MSG: &str = "Comandos:
/tasa para obtener la tasa actual
/tasa [fecha] para obtener la tasa efectiva para un día específico
/ayuda para obtener ayuda sobre el uso general del bot
/fechas para obtener ayuda sobre formatos de fecha soportados";

pub const HELP_DATES_MSG: &str = "Se reconocen los siguientes formatos de fecha:
día/mes/año
día-mes-año
año-mes-dia
día/mes
día-mes

Ejemplos: 20/07/2025, 20-7-25, 2025-07-20, 20/07";

pub const INVALID_DATE_MSG: &str =
    "Fecha invalida, use el comando /fechas para conocer los formatos soportados";

pub const RATE_UNAVAILABLE_MSG: &str = "Error: No se pudo obtener la información de la tasa";

/// Reply for dates before the first published rate.
pub fn before_coverage_message(coverage_start: NaiveDate) -> String {
    format!(
        "No hay tasas de cambio disponibles antes de {}",
        coverage_start.format("%Y-%m-%d")
    )
}

/// Value with 4 fractional digits.
pub fn format_value(value: Decimal) -> String {
    round_value(value).to_string()
}

/// Value with 4 fractional digits and an explicit sign.
pub fn format_signed(value: Decimal) -> String {
    let rounded = round_value(value);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        rounded.to_string()
    } else {
        format!("+{}", rounded.abs())
    }
}

/// Reply to a rate query for `target`.
pub fn format_rate_reply(target: NaiveDate, rate: &Rate) -> String {
    format!(
        "Tasa efectiva para el dia {} {}:\nTasa del dia {} {}\nBsD. {}",
        weekday_name_of(target),
        target.format("%Y-%m-%d"),
        rate.weekday_name(),
        rate.effective_date().format("%Y-%m-%d"),
        format_value(rate.value),
    )
}

/// Broadcast text for a newly published rate.
pub fn format_update_message(change: &RateChange) -> String {
    format!(
        "🚨 Nueva tasa Dólar 🚨\n\nEfectiva el día {} {}\nBsD. {} ({})",
        change.rate.weekday_name(),
        change.rate.effective_date().format("%Y-%m-%d"),
        format_value(change.rate.value),
        format_signed(change.display_change()),
    )
}
