use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Accepts ids sent either as JSON strings or numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

pub fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Record {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        let numeric: Record = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        let text: Record = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();

        assert_eq!(numeric.id, "3");
        assert_eq!(text.id, "abc");
        assert!(serde_json::from_str::<Record>(r#"{"id": null}"#).is_err());
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("cliente@teste.com"));
        assert!(!is_valid_email("cliente@teste"));
        assert!(!is_valid_email("@teste.com"));
        assert!(!is_valid_email("cliente teste@x.com"));
        assert!(!is_valid_email("cliente.teste.com"));
    }
}
