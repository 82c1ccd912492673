//! Классификация формы оплаты ERP как "наличной" по её названию.
//!
//! ERP не отдаёт признак типа формы оплаты, поэтому решение принимается
//! по вхождению одного из слов словаря в название (без учёта регистра).
//! Для наличных форм денежный счёт не указывается.

/// Словарь подстрок, обозначающих наличную оплату
pub const CASH_FORM_KEYWORDS: &[&str] = &["готівк", "наличн", "cash"];

/// Подстроки, которые содержат слово из словаря, но означают безнал
pub const NON_CASH_FORM_KEYWORDS: &[&str] = &["безготівк", "безналичн", "non-cash", "cashless"];

/// true, если название формы оплаты содержит одно из слов словаря
pub fn is_cash_payment_form(form_name: &str) -> bool {
    let name = form_name.to_lowercase();
    if NON_CASH_FORM_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return false;
    }
    CASH_FORM_KEYWORDS.iter().any(|kw| name.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_forms() {
        assert!(is_cash_payment_form("Оплата готівкою"));
        assert!(is_cash_payment_form("ГОТІВКА"));
        assert!(is_cash_payment_form("Наличные"));
        assert!(is_cash_payment_form("Cash on delivery"));
        assert!(is_cash_payment_form("Накладений платіж (готівковий)"));
    }

    #[test]
    fn test_non_cash_forms() {
        assert!(!is_cash_payment_form("Безготівковий розрахунок"));
        assert!(!is_cash_payment_form("Безналичный расчет"));
        assert!(!is_cash_payment_form("Cashless"));
        assert!(!is_cash_payment_form("Оплата карткою"));
        assert!(!is_cash_payment_form("LiqPay"));
        assert!(!is_cash_payment_form(""));
    }
}
