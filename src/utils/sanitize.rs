use serde_json::Value;

/// Masks credentials and customer identifiers in a JSON payload before it is logged.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let sanitized = if is_sensitive_field(key) {
                        mask_value(val)
                    } else {
                        sanitize_json(val)
                    };
                    (key.clone(), sanitized)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "email"
            | "authorization"
            | "authorization_code"
            | "secret"
            | "secret_key"
            | "token"
            | "password"
            | "api_key"
            | "access_code"
            | "bin"
            | "last4"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > 8 => {
            let chars: Vec<char> = s.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            Value::String(format!("{head}****{tail}"))
        }
        _ => Value::String("****".to_string()),
    }
}
