/// Одноразовый токен, который ERP возвращает на одном шаге, чтобы следующий
/// шаг того же запуска не создавал повторно контрагента/контакт.
///
/// Токен не клонируется и не сериализуется: его забирает по значению
/// следующий шаг, после завершения запуска он исчезает.
#[derive(Debug, PartialEq, Eq)]
pub enum IdempotencyToken {
    NoToken,
    Token(String),
}

impl IdempotencyToken {
    /// Пустая строка от ERP равнозначна отсутствию токена
    pub fn from_option(value: Option<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => IdempotencyToken::Token(v),
            _ => IdempotencyToken::NoToken,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IdempotencyToken::Token(v) => Some(v),
            IdempotencyToken::NoToken => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, IdempotencyToken::Token(_))
    }
}

impl Default for IdempotencyToken {
    fn default() -> Self {
        IdempotencyToken::NoToken
    }
}
