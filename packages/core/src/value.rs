//! Dynamic values exchanged with the embedding interpreter.
//!
//! The hosting DSL is dynamically typed, so values crossing the call surface
//! are modelled the way it sees them: primitives are copied, objects are
//! shared handles ([`ObjectRef`]). Two [`Value::Object`]s compare equal only
//! when they are the same handle, which is what makes "the registry hands
//! back the live object" and "tagging mutates objects in place" observable.
//!
//! | Variant | `type_of()` | Display |
//! |---------|-------------|---------|
//! | `Undefined` | `undefined` | `undefined` |
//! | `Null` | `object` | `null` |
//! | `Bool` | `boolean` | `true` / `false` |
//! | `Number` | `number` | integral values without a fraction |
//! | `String` | `string` | the text |
//! | `Object` | `object` or `function` | depends on [`ObjectKind`] |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Serialize, Serializer};

use crate::function::{ArgList, NamedFunction};
use crate::host::HostError;
use crate::record::{display_from_json, Displayable};

/// A callable exposed to the host.
pub type HostFn = Rc<dyn Fn(&[Value]) -> Result<Value, HostError>>;

/// Shared, mutable handle to an [`Object`].
pub type ObjectRef = Rc<RefCell<Object>>;

/// Named properties of an object, kept in key order.
pub type Props = BTreeMap<String, Value>;

/// JSON stand-in for a reference back to an enclosing object.
pub const CIRCULAR: &str = "[Circular]";

/// A function value, with or without a display name.
#[derive(Clone)]
pub enum HostFunction {
    Anonymous(HostFn),
    Named(NamedFunction<HostFn>),
}

impl HostFunction {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, HostError> + 'static) -> Self {
        Self::Anonymous(Rc::new(f))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Anonymous(_) => None,
            Self::Named(nf) => Some(nf.name()),
        }
    }

    /// The underlying callable, without its name.
    pub fn callable(&self) -> HostFn {
        match self {
            Self::Anonymous(f) => Rc::clone(f),
            Self::Named(nf) => Rc::clone(nf.func()),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, HostError> {
        match self {
            Self::Anonymous(f) => (**f)(args),
            Self::Named(nf) => (**nf.func())(args),
        }
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous(_) => f.write_str("[Function (anonymous)]"),
            Self::Named(nf) => write!(f, "[Function: {}]", nf.name()),
        }
    }
}

/// What an object is, beyond its named properties.
#[derive(Debug)]
pub enum ObjectKind {
    /// An ordinary record.
    Plain,
    Array(Vec<Value>),
    /// A string promoted to an object so that it can carry properties.
    StringBox(String),
    /// A record whose display text is its own JSON.
    Agent,
    Function(HostFunction),
}

#[derive(Debug)]
pub struct Object {
    pub kind: ObjectKind,
    pub props: Props,
}

impl Object {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            props: Props::new(),
        }
    }

    /// The JSON form. A reference back to an object already being
    /// serialised becomes the string [`CIRCULAR`].
    pub fn to_json(&self) -> serde_json::Value {
        self.json_in(&mut Vec::new())
    }

    fn json_in(&self, seen: &mut Seen) -> serde_json::Value {
        use serde_json::Value as Json;
        seen.push(self);
        let json = match &self.kind {
            ObjectKind::Plain | ObjectKind::Agent => Json::Object(
                self.props
                    .iter()
                    .filter_map(|(k, v)| v.json_member(seen).map(|j| (k.clone(), j)))
                    .collect(),
            ),
            ObjectKind::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|v| v.json_member(seen).unwrap_or(Json::Null))
                    .collect(),
            ),
            ObjectKind::StringBox(s) => Json::String(s.clone()),
            ObjectKind::Function(HostFunction::Named(nf)) => nf.to_json(),
            ObjectKind::Function(HostFunction::Anonymous(_)) => Json::Null,
        };
        seen.pop();
        json
    }

    // Arrays print a reference back to an enclosing object as an empty
    // element, like the host's `join`.
    fn display_in(&self, seen: &mut Seen) -> String {
        match &self.kind {
            ObjectKind::Plain => "[object Object]".to_string(),
            ObjectKind::Array(items) => {
                seen.push(self);
                let text = items
                    .iter()
                    .map(|v| match v {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.display_in(seen),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                seen.pop();
                text
            }
            ObjectKind::StringBox(s) => s.clone(),
            ObjectKind::Agent => display_from_json(&self.json_in(seen)),
            ObjectKind::Function(HostFunction::Named(nf)) => nf.display_text(),
            ObjectKind::Function(HostFunction::Anonymous(_)) => {
                "function () { [native code] }".to_string()
            }
        }
    }
}

// Objects on the path from the root of the current serialisation.
type Seen = Vec<*const Object>;

fn is_seen(obj: &ObjectRef, seen: &Seen) -> bool {
    seen.contains(&(obj.as_ptr() as *const Object))
}

/// A value as seen by the hosting DSL.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(ObjectRef),
}

impl Value {
    pub fn from_object(object: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// A fresh plain record with the given properties.
    pub fn plain(props: Props) -> Self {
        Self::from_object(Object {
            kind: ObjectKind::Plain,
            props,
        })
    }

    pub fn array(items: Vec<Value>) -> Self {
        Self::from_object(Object::new(ObjectKind::Array(items)))
    }

    /// A fresh boxed string. Never identical to any other value.
    pub fn boxed_string(s: impl Into<String>) -> Self {
        Self::from_object(Object::new(ObjectKind::StringBox(s.into())))
    }

    pub fn function(f: HostFunction) -> Self {
        Self::from_object(Object::new(ObjectKind::Function(f)))
    }

    /// Build a value from JSON. Objects and arrays are always fresh handles.
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::plain(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// The host language's `typeof` for this value.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) => match obj.borrow().kind {
                ObjectKind::Function(_) => "function",
                _ => "object",
            },
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Strict equality: handle identity for objects, value equality for
    /// primitives (so `NaN` is not equal to itself).
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text of a string primitive or a boxed string.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::StringBox(s) => Some(s.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// A snapshot of an array's elements. The elements themselves are shared.
    pub fn array_items(&self) -> Option<Vec<Value>> {
        match &self.as_object()?.borrow().kind {
            ObjectKind::Array(items) => Some(items.clone()),
            _ => None,
        }
    }

    /// The function behind a function value, cloned out of its cell.
    pub fn as_function(&self) -> Option<HostFunction> {
        match &self.as_object()?.borrow().kind {
            ObjectKind::Function(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// Read a named property; primitives and missing keys give `Undefined`.
    pub fn get_prop(&self, key: &str) -> Value {
        self.as_object()
            .and_then(|obj| obj.borrow().props.get(key).cloned())
            .unwrap_or_default()
    }

    /// Set a named property on an object. Returns `false` (and does nothing)
    /// for primitives.
    pub fn set_prop(&self, key: impl Into<String>, value: Value) -> bool {
        match self {
            Value::Object(obj) => {
                obj.borrow_mut().props.insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Call a function value.
    pub fn call(&self, args: &[Value]) -> Result<Value, HostError> {
        // Clone the function out first so the callee may borrow this object.
        let f = self
            .as_function()
            .ok_or_else(|| HostError::NotCallable(self.to_display_string()))?;
        f.call(args)
    }

    pub fn to_display_string(&self) -> String {
        self.display_in(&mut Vec::new())
    }

    fn display_in(&self, seen: &mut Seen) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Object(obj) if is_seen(obj, seen) => String::new(),
            Value::Object(obj) => obj.borrow().display_in(seen),
        }
    }

    /// The JSON form. `undefined` becomes `null` at the top level and is
    /// dropped from records; cycles are cut with [`CIRCULAR`].
    pub fn to_json(&self) -> serde_json::Value {
        self.json_in(&mut Vec::new())
    }

    fn json_in(&self, seen: &mut Seen) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Object(obj) if is_seen(obj, seen) => {
                tracing::warn!("circular reference replaced in JSON output");
                Json::String(CIRCULAR.to_string())
            }
            Value::Object(obj) => obj.borrow().json_in(seen),
        }
    }

    // `None` for members that record serialization skips.
    fn json_member(&self, seen: &mut Seen) -> Option<serde_json::Value> {
        match self {
            Value::Undefined => None,
            Value::Object(obj)
                if matches!(
                    obj.borrow().kind,
                    ObjectKind::Function(HostFunction::Anonymous(_))
                ) =>
            {
                None
            }
            _ => Some(self.json_in(seen)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// An array value as a shared argument list: edits to the array after a call
/// is bound are seen when it runs. Non-array objects have no arguments.
impl ArgList for ObjectRef {
    type Item = Value;

    fn arg_count(&self) -> usize {
        match &self.borrow().kind {
            ObjectKind::Array(items) => items.len(),
            _ => 0,
        }
    }

    fn arg(&self, index: usize) -> Option<Value> {
        match &self.borrow().kind {
            ObjectKind::Array(items) => items.get(index).cloned(),
            _ => None,
        }
    }
}

// --- helpers -----------------------------------------------------------------

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        // covers -0
        "0".to_string()
    } else {
        n.to_string()
    }
}

// Integral values within the exactly-representable range serialise without a
// fraction; non-finite numbers become null.
fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

// --- tests -------------------------------------------------------------------
