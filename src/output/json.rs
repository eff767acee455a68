use serde::Serialize;

pub fn emit_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_compact_or_pretty() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(emit_json(&value, false).expect("json"), "{\"a\":1}");
        assert!(emit_json(&value, true).expect("json").contains("\n  \"a\": 1"));
    }
}
