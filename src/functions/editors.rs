//! Editors: functions that mutate the record through a path and return nil.
//!
//! Map editors read the target map, edit the copy and write it back. A
//! target that is not a map is left untouched.

use std::collections::HashSet;

use regex::Regex;

use crate::{
    context::{GetSetter, Getter, TransformContext},
    evaluator::{BindError, EvalError},
    functions::{Arguments, ExprFunc, FunctionRegistry, ParamKind},
    value::{Map, Value},
};

pub(crate) fn register<K: TransformContext>(registry: &mut FunctionRegistry<K>) {
    use ParamKind as P;

    registry
        .register_editor("set", &[P::GetSetter, P::Getter], set::<K>)
        .register_editor("keep_keys", &[P::GetSetter, P::Strings], keep_keys::<K>)
        .register_editor("delete_key", &[P::GetSetter, P::String], delete_key::<K>)
        .register_editor("delete_matching_keys", &[P::GetSetter, P::Regex], delete_matching_keys::<K>)
        .register_editor("truncate_all", &[P::GetSetter, P::Int], truncate_all::<K>)
        .register_editor("limit", &[P::GetSetter, P::Int], limit::<K>)
        .register_editor("replace_match", &[P::GetSetter, P::String, P::String], replace_match::<K>)
        .register_editor("replace_pattern", &[P::GetSetter, P::Regex, P::String], replace_pattern::<K>)
        .register_editor(
            "replace_all_matches",
            &[P::GetSetter, P::String, P::String],
            replace_all_matches::<K>,
        )
        .register_editor(
            "replace_all_patterns",
            &[P::GetSetter, P::Regex, P::String],
            replace_all_patterns::<K>,
        );
}

type Factory<K> = Result<Box<dyn ExprFunc<K>>, BindError>;

fn edit_map<K: TransformContext>(
    target: &GetSetter<K>,
    record: &mut K::Record<'_>,
    edit: impl FnOnce(&mut Map),
) -> Result<Value, EvalError> {
    if let Value::Map(mut map) = target.get(record)? {
        edit(&mut map);
        target.set(record, Value::Map(map))?;
    }
    Ok(Value::Nil)
}

fn non_negative<K: TransformContext>(args: &mut Arguments<K>) -> Result<usize, BindError> {
    let n = args.int()?;
    usize::try_from(n).map_err(|_| args.invalid(format!("{n} must not be negative")))
}

/// Compiles a glob (`*`, `?`, `[...]`) into an anchored regex.
pub(crate) fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    let mut chars = glob.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            '[' => {
                pattern.push('[');
                for class_ch in chars.by_ref() {
                    match class_ch {
                        ']' => break,
                        '\\' => pattern.push_str("\\\\"),
                        '!' if pattern.ends_with('[') => pattern.push('^'),
                        other => pattern.push(other),
                    }
                }
                pattern.push(']');
            }
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

fn glob_arg<K: TransformContext>(args: &mut Arguments<K>) -> Result<Regex, BindError> {
    let glob = args.string()?;
    glob_to_regex(&glob).map_err(|e| args.invalid(e.to_string()))
}

struct Set<K: TransformContext> {
    target: GetSetter<K>,
    value: Getter<K>,
}

impl<K: TransformContext> ExprFunc<K> for Set<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        let value = self.value.get(record)?;
        if !value.is_nil() {
            self.target.set(record, value)?;
        }
        Ok(Value::Nil)
    }
}

fn set<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(Set {
        target: args.get_setter()?,
        value: args.getter()?,
    }))
}

struct KeepKeys<K: TransformContext> {
    target: GetSetter<K>,
    keys: HashSet<String>,
}

impl<K: TransformContext> ExprFunc<K> for KeepKeys<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        edit_map(&self.target, record, |map| {
            map.retain(|key, _| self.keys.contains(key))
        })
    }
}

fn keep_keys<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(KeepKeys {
        target: args.get_setter()?,
        keys: args.strings()?.into_iter().collect(),
    }))
}

struct DeleteKey<K: TransformContext> {
    target: GetSetter<K>,
    key: String,
}

impl<K: TransformContext> ExprFunc<K> for DeleteKey<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        edit_map(&self.target, record, |map| {
            map.remove(&self.key);
        })
    }
}

fn delete_key<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(DeleteKey {
        target: args.get_setter()?,
        key: args.string()?,
    }))
}

struct DeleteMatchingKeys<K: TransformContext> {
    target: GetSetter<K>,
    pattern: Regex,
}

impl<K: TransformContext> ExprFunc<K> for DeleteMatchingKeys<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        edit_map(&self.target, record, |map| {
            map.retain(|key, _| !self.pattern.is_match(key))
        })
    }
}

fn delete_matching_keys<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(DeleteMatchingKeys {
        target: args.get_setter()?,
        pattern: args.regex()?,
    }))
}

struct TruncateAll<K: TransformContext> {
    target: GetSetter<K>,
    limit: usize,
}

impl<K: TransformContext> ExprFunc<K> for TruncateAll<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        edit_map(&self.target, record, |map| {
            for value in map.values_mut() {
                if let Value::String(s) = value {
                    truncate_at_boundary(s, self.limit);
                }
            }
        })
    }
}

/// Truncates to at most `limit` bytes without splitting a character.
fn truncate_at_boundary(s: &mut String, limit: usize) {
    if s.len() <= limit {
        return;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

fn truncate_all<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    let target = args.get_setter()?;
    let limit = non_negative(&mut args)?;
    Ok(Box::new(TruncateAll { target, limit }))
}

struct Limit<K: TransformContext> {
    target: GetSetter<K>,
    limit: usize,
}

impl<K: TransformContext> ExprFunc<K> for Limit<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        edit_map(&self.target, record, |map| {
            if map.len() > self.limit {
                *map = std::mem::take(map).into_iter().take(self.limit).collect();
            }
        })
    }
}

fn limit<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    let target = args.get_setter()?;
    let limit = non_negative(&mut args)?;
    Ok(Box::new(Limit { target, limit }))
}

/// How a matching string value is rewritten.
enum Rewrite {
    /// Whole value replaced when the anchored glob matches
    Glob(Regex),
    /// Every regex match replaced, `$n` groups expanded
    Pattern(Regex),
}

impl Rewrite {
    fn apply(&self, input: &str, replacement: &str) -> Option<String> {
        match self {
            Rewrite::Glob(glob) => glob.is_match(input).then(|| replacement.to_string()),
            Rewrite::Pattern(pattern) => pattern
                .is_match(input)
                .then(|| pattern.replace_all(input, replacement).into_owned()),
        }
    }
}

struct Replace<K: TransformContext> {
    target: GetSetter<K>,
    rewrite: Rewrite,
    replacement: String,
}

impl<K: TransformContext> ExprFunc<K> for Replace<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        if let Value::String(current) = self.target.get(record)?
            && let Some(updated) = self.rewrite.apply(&current, &self.replacement)
        {
            self.target.set(record, Value::String(updated))?;
        }
        Ok(Value::Nil)
    }
}

struct ReplaceAll<K: TransformContext> {
    target: GetSetter<K>,
    rewrite: Rewrite,
    replacement: String,
}

impl<K: TransformContext> ExprFunc<K> for ReplaceAll<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        edit_map(&self.target, record, |map| {
            for value in map.values_mut() {
                if let Value::String(current) = value
                    && let Some(updated) = self.rewrite.apply(current, &self.replacement)
                {
                    *current = updated;
                }
            }
        })
    }
}

fn replace_match<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(Replace {
        target: args.get_setter()?,
        rewrite: Rewrite::Glob(glob_arg(&mut args)?),
        replacement: args.string()?,
    }))
}

fn replace_pattern<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(Replace {
        target: args.get_setter()?,
        rewrite: Rewrite::Pattern(args.regex()?),
        replacement: args.string()?,
    }))
}

fn replace_all_matches<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(ReplaceAll {
        target: args.get_setter()?,
        rewrite: Rewrite::Glob(glob_arg(&mut args)?),
        replacement: args.string()?,
    }))
}

fn replace_all_patterns<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(ReplaceAll {
        target: args.get_setter()?,
        rewrite: Rewrite::Pattern(args.regex()?),
        replacement: args.string()?,
    }))
}
