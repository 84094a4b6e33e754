use documents::Document;
use identity::CallerIdentity;
use serde_json::Value;

pub(crate) fn alice() -> CallerIdentity {
    CallerIdentity::new("uid-alice", "a@x.com")
}

pub(crate) fn bob() -> CallerIdentity {
    CallerIdentity::new("uid-bob", "b@x.com")
}

pub(crate) fn body<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("test body must deserialize")
}

pub(crate) fn field<'a>(doc: &'a Document, name: &str) -> &'a str {
    doc.get(name).and_then(Value::as_str).unwrap_or_default()
}
