use crate::{
    ast::Field,
    evaluator::EvalError,
    pdata::{InstrumentationScope, Resource, SpanId, TraceId},
    value::{Map, Value},
};

/// Records that can reach their enclosing resource.
pub trait ResourceAccess {
    fn resource(&self) -> &Resource;
    fn resource_mut(&mut self) -> &mut Resource;
}

/// Records that can reach their enclosing instrumentation scope.
pub trait ScopeAccess {
    fn scope(&self) -> &InstrumentationScope;
    fn scope_mut(&mut self) -> &mut InstrumentationScope;
}

/// Path below `resource`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePath {
    Attributes,
    AttributeKey(String),
    DroppedAttributesCount,
}

impl ResourcePath {
    /// Resolves the fields following `resource` (or the whole path in the
    /// resource context).
    pub fn parse(fields: &[Field]) -> Result<Self, String> {
        let (first, rest) = split_first(fields, "resource")?;
        let path = match first.name.as_str() {
            "attributes" => match &first.map_key {
                Some(key) => ResourcePath::AttributeKey(key.clone()),
                None => ResourcePath::Attributes,
            },
            "dropped_attributes_count" => {
                scalar(first)?;
                ResourcePath::DroppedAttributesCount
            }
            other => return Err(unknown_field(other, "resource")),
        };
        expect_end(rest)?;
        Ok(path)
    }

    pub fn get<R: ResourceAccess + ?Sized>(&self, record: &R) -> Value {
        let resource = record.resource();
        match self {
            ResourcePath::Attributes => Value::Map(resource.attributes.clone()),
            ResourcePath::AttributeKey(key) => map_get(&resource.attributes, key),
            ResourcePath::DroppedAttributesCount => {
                Value::Integer(i64::from(resource.dropped_attributes_count))
            }
        }
    }

    pub fn set<R: ResourceAccess + ?Sized>(&self, record: &mut R, value: Value) -> Result<(), EvalError> {
        let resource = record.resource_mut();
        match self {
            ResourcePath::Attributes => set_map(
                &mut resource.attributes,
                "resource.attributes",
                value,
            ),
            ResourcePath::AttributeKey(key) => {
                map_set(&mut resource.attributes, key, value);
                Ok(())
            }
            ResourcePath::DroppedAttributesCount => set_u32(
                &mut resource.dropped_attributes_count,
                "resource.dropped_attributes_count",
                value,
            ),
        }
    }
}

/// Path below `instrumentation_scope`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopePath {
    Name,
    Version,
    Attributes,
    AttributeKey(String),
    DroppedAttributesCount,
}

impl ScopePath {
    pub fn parse(fields: &[Field]) -> Result<Self, String> {
        let (first, rest) = split_first(fields, "instrumentation_scope")?;
        let path = match first.name.as_str() {
            "name" => {
                scalar(first)?;
                ScopePath::Name
            }
            "version" => {
                scalar(first)?;
                ScopePath::Version
            }
            "attributes" => match &first.map_key {
                Some(key) => ScopePath::AttributeKey(key.clone()),
                None => ScopePath::Attributes,
            },
            "dropped_attributes_count" => {
                scalar(first)?;
                ScopePath::DroppedAttributesCount
            }
            other => return Err(unknown_field(other, "instrumentation_scope")),
        };
        expect_end(rest)?;
        Ok(path)
    }

    pub fn get<R: ScopeAccess + ?Sized>(&self, record: &R) -> Value {
        let scope = record.scope();
        match self {
            ScopePath::Name => Value::String(scope.name.clone()),
            ScopePath::Version => Value::String(scope.version.clone()),
            ScopePath::Attributes => Value::Map(scope.attributes.clone()),
            ScopePath::AttributeKey(key) => map_get(&scope.attributes, key),
            ScopePath::DroppedAttributesCount => {
                Value::Integer(i64::from(scope.dropped_attributes_count))
            }
        }
    }

    pub fn set<R: ScopeAccess + ?Sized>(&self, record: &mut R, value: Value) -> Result<(), EvalError> {
        let scope = record.scope_mut();
        match self {
            ScopePath::Name => set_string(&mut scope.name, "instrumentation_scope.name", value),
            ScopePath::Version => {
                set_string(&mut scope.version, "instrumentation_scope.version", value)
            }
            ScopePath::Attributes => set_map(
                &mut scope.attributes,
                "instrumentation_scope.attributes",
                value,
            ),
            ScopePath::AttributeKey(key) => {
                map_set(&mut scope.attributes, key, value);
                Ok(())
            }
            ScopePath::DroppedAttributesCount => set_u32(
                &mut scope.dropped_attributes_count,
                "instrumentation_scope.dropped_attributes_count",
                value,
            ),
        }
    }
}

// Path parsing helpers. Errors are reasons; the context wraps them into a
// bind error carrying the full path text.

pub(crate) fn split_first<'a>(
    fields: &'a [Field],
    parent: &str,
) -> Result<(&'a Field, &'a [Field]), String> {
    fields
        .split_first()
        .ok_or_else(|| format!("'{parent}' must be followed by a field"))
}

pub(crate) fn scalar(field: &Field) -> Result<(), String> {
    match field.map_key {
        Some(_) => Err(format!("'{}' cannot be indexed", field.name)),
        None => Ok(()),
    }
}

pub(crate) fn expect_end(rest: &[Field]) -> Result<(), String> {
    match rest.first() {
        Some(field) => Err(format!("unexpected field '{}'", field.name)),
        None => Ok(()),
    }
}

pub(crate) fn unknown_field(name: &str, context: &str) -> String {
    format!("'{name}' is not a field of {context}")
}

// Value access helpers shared by every context.

/// Missing keys read as nil.
pub(crate) fn map_get(map: &Map, key: &str) -> Value {
    map.get(key).cloned().unwrap_or_default()
}

/// Setting a key to nil leaves the map untouched.
pub(crate) fn map_set(map: &mut Map, key: &str, value: Value) {
    if !value.is_nil() {
        map.insert(key.to_string(), value);
    }
}

pub(crate) fn mismatch(target: &'static str, expected: &'static str, value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        target,
        expected,
        found: value.type_name(),
    }
}

pub(crate) fn set_map(slot: &mut Map, target: &'static str, value: Value) -> Result<(), EvalError> {
    match value {
        Value::Map(map) => {
            *slot = map;
            Ok(())
        }
        other => Err(mismatch(target, "map", &other)),
    }
}

pub(crate) fn set_string(slot: &mut String, target: &'static str, value: Value) -> Result<(), EvalError> {
    match value {
        Value::String(s) => {
            *slot = s;
            Ok(())
        }
        other => Err(mismatch(target, "string", &other)),
    }
}

pub(crate) fn expect_int(target: &'static str, value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| mismatch(target, "integer", value))
}

pub(crate) fn expect_float(target: &'static str, value: &Value) -> Result<f64, EvalError> {
    value.as_float().ok_or_else(|| mismatch(target, "number", value))
}

pub(crate) fn expect_bool(target: &'static str, value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| mismatch(target, "boolean", value))
}

pub(crate) fn set_u32(slot: &mut u32, target: &'static str, value: Value) -> Result<(), EvalError> {
    let n = expect_int(target, &value)?;
    *slot = u32::try_from(n).map_err(|_| EvalError::OutOfRange { target, value: n })?;
    Ok(())
}

pub(crate) fn set_u64(slot: &mut u64, target: &'static str, value: Value) -> Result<(), EvalError> {
    let n = expect_int(target, &value)?;
    *slot = u64::try_from(n).map_err(|_| EvalError::OutOfRange { target, value: n })?;
    Ok(())
}

/// Timestamps and counters are stored unsigned; values past `i64::MAX`
/// saturate when read.
pub(crate) fn u64_value(n: u64) -> Value {
    Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

pub(crate) fn id_from_bytes<T: IdBytes>(target: &'static str, value: &Value) -> Result<T, EvalError> {
    value
        .as_bytes()
        .and_then(T::from_bytes)
        .ok_or_else(|| mismatch(target, T::EXPECTED, value))
}

pub(crate) fn id_from_hex<T: IdBytes>(target: &'static str, value: &Value) -> Result<T, EvalError> {
    value
        .as_str()
        .and_then(T::from_hex_str)
        .ok_or_else(|| mismatch(target, T::EXPECTED_HEX, value))
}

pub(crate) trait IdBytes: Sized {
    const EXPECTED: &'static str;
    const EXPECTED_HEX: &'static str;

    fn from_bytes(bytes: &[u8]) -> Option<Self>;
    fn from_hex_str(s: &str) -> Option<Self>;
}

impl IdBytes for TraceId {
    const EXPECTED: &'static str = "16 bytes";
    const EXPECTED_HEX: &'static str = "32 hex digits";

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        TraceId::from_slice(bytes)
    }

    fn from_hex_str(s: &str) -> Option<Self> {
        TraceId::from_hex(s)
    }
}

impl IdBytes for SpanId {
    const EXPECTED: &'static str = "8 bytes";
    const EXPECTED_HEX: &'static str = "16 hex digits";

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        SpanId::from_slice(bytes)
    }

    fn from_hex_str(s: &str) -> Option<Self> {
        SpanId::from_hex(s)
    }
}

/// Looks up a symbol in an enum table.
pub(crate) fn lookup_enum(table: &[(&str, i64)], symbol: &str) -> Option<i64> {
    table
        .iter()
        .find(|(name, _)| *name == symbol)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path_parse() {
        let fields = vec![Field::with_key("attributes", "host")];
        assert_eq!(
            ResourcePath::parse(&fields),
            Ok(ResourcePath::AttributeKey("host".to_string()))
        );

        let fields = vec![Field::with_key("dropped_attributes_count", "x")];
        assert!(ResourcePath::parse(&fields).is_err());

        let fields = vec![Field::new("attributes"), Field::new("extra")];
        assert!(ResourcePath::parse(&fields).is_err());

        assert!(ResourcePath::parse(&[]).is_err());
    }

    #[test]
    fn test_map_set_ignores_nil() {
        let mut map = Map::new();
        map_set(&mut map, "a", Value::Nil);
        assert!(map.is_empty());
        map_set(&mut map, "a", Value::Integer(1));
        assert_eq!(map_get(&map, "a"), Value::Integer(1));
        assert_eq!(map_get(&map, "b"), Value::Nil);
    }

    #[test]
    fn test_set_u32_range() {
        let mut slot = 0u32;
        assert!(set_u32(&mut slot, "count", Value::Integer(7)).is_ok());
        assert_eq!(slot, 7);
        assert_eq!(
            set_u32(&mut slot, "count", Value::Integer(-1)),
            Err(EvalError::OutOfRange {
                target: "count",
                value: -1
            })
        );
        assert!(matches!(
            set_u32(&mut slot, "count", Value::from("7")),
            Err(EvalError::TypeMismatch { .. })
        ));
    }
}
