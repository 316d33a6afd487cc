//! Picks the canonical currency of a country.

use crate::source::RawCurrency;

/// Returns the code of the first listed currency.
///
/// Countries may list several currencies; the first one is used for
/// valuation. Returns `None` when the list is absent or empty, or when the
/// first entry carries no code (an empty code counts as none). Later entries
/// are never consulted and the code format is not validated.
///
/// # Examples
///
/// ```
/// use terra_core::currency::resolve_currency_code;
/// use terra_core::source::RawCurrency;
///
/// let currencies = vec![RawCurrency::with_code("CHF"), RawCurrency::with_code("EUR")];
/// assert_eq!(resolve_currency_code(Some(&currencies)), Some("CHF"));
/// assert_eq!(resolve_currency_code(None), None);
/// ```
pub fn resolve_currency_code(currencies: Option<&[RawCurrency]>) -> Option<&str> {
    currencies?
        .first()?
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
}
