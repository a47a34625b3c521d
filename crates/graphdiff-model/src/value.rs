//! In-memory object graph values.
//!
//! A [`Value`] is either a leaf (boolean, integer, float, text), an owned
//! container (sequence, keyed map, set), a shared [`BeanRef`] whose members
//! can point back into the graph, or an [`OpaqueValue`] that only a custom
//! strategy knows how to compare.
//!
//! Beans are the only values with identity. Two handles to the same bean
//! share an [`Identity`]; that is what the comparison engine tracks to detect
//! circular references.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

/// Runtime type tag of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    /// A bean, tagged with its type name.
    Bean(String),
    Seq,
    Map,
    Set,
    /// An opaque value, tagged with its type name.
    Opaque(String),
}

impl ValueType {
    /// Short name of the type, as used in configuration and error messages.
    pub fn name(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Bean(name) | Self::Opaque(name) => name,
            Self::Seq => "seq",
            Self::Map => "map",
            Self::Set => "set",
        }
    }

    /// Returns `true` for booleans, integers, floats, and text.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Bool | Self::Int | Self::Float | Self::Text)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of a bean type: its name, its members in declaration order,
/// and the members that make up its equality key.
///
/// A type without key members compares by instance identity, like an object
/// that never overrides equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeanType {
    name: String,
    members: Vec<String>,
    key: Vec<String>,
}

impl BeanType {
    /// Create a bean type with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            key: Vec::new(),
        }
    }

    /// Declare a member.
    pub fn member(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.members.contains(&name) {
            self.members.push(name);
        }
        self
    }

    /// Declare a key member. The member is declared too if it is not already.
    pub fn keyed_by(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.key.contains(&name) {
            self.key.push(name.clone());
        }
        self.member(name)
    }

    /// Wrap in an `Arc` for sharing between bean instances.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared members in declaration order.
    pub fn member_names(&self) -> &[String] {
        &self.members
    }

    /// Members compared by bean equality.
    pub fn key_members(&self) -> &[String] {
        &self.key
    }
}

/// Address of a shared bean allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(usize);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A bean instance: a typed bag of member values.
#[derive(Debug)]
pub struct Bean {
    bean_type: Arc<BeanType>,
    fields: HashMap<String, Value>,
}

impl Bean {
    /// Create a bean with every member unset.
    pub fn new(bean_type: Arc<BeanType>) -> Self {
        Self {
            bean_type,
            fields: HashMap::new(),
        }
    }

    /// Builder-style member assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn bean_type(&self) -> &Arc<BeanType> {
        &self.bean_type
    }

    /// Current value of a member, `None` when unset.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Assign a member.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Clear a member, returning its previous value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Wrap in a shared handle.
    pub fn into_ref(self) -> BeanRef {
        BeanRef::new(self)
    }
}

/// Shared handle to a bean.
///
/// Handles are cheap to clone. Graphs built from handles may be cyclic; a
/// cycle of strong handles is never freed, so long-lived cyclic graphs
/// should be broken explicitly with [`Bean::unset`] when no longer needed.
#[derive(Clone)]
pub struct BeanRef(Arc<RwLock<Bean>>);

impl BeanRef {
    pub fn new(bean: Bean) -> Self {
        Self(Arc::new(RwLock::new(bean)))
    }

    /// Identity of the shared allocation.
    pub fn identity(&self) -> Identity {
        Identity(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// Returns `true` if both handles point at the same bean.
    pub fn ptr_eq(&self, other: &BeanRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Bean> {
        self.0.read().expect("bean lock poisoned")
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Bean> {
        self.0.write().expect("bean lock poisoned")
    }

    pub fn bean_type(&self) -> Arc<BeanType> {
        Arc::clone(self.read().bean_type())
    }

    /// Clone of a member's current value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().set(name, value);
    }

    fn key_eq(&self, other: &BeanRef) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let left = self.read();
        let right = other.read();
        let bean_type = left.bean_type();
        if bean_type.name() != right.bean_type().name() || bean_type.key_members().is_empty() {
            return false;
        }
        bean_type.key_members().iter().all(|key| {
            match (left.get(key), right.get(key)) {
                (Some(l), Some(r)) => l.shallow_eq(r),
                (None, None) => true,
                _ => false,
            }
        })
    }

    fn key_hash<H: Hasher>(&self, state: &mut H) {
        let bean = self.read();
        let bean_type = bean.bean_type();
        if bean_type.key_members().is_empty() {
            self.identity().hash(state);
            return;
        }
        bean_type.name().hash(state);
        for key in bean_type.key_members() {
            match bean.get(key) {
                Some(value) => value.shallow_hash(state),
                None => 0u8.hash(state),
            }
        }
    }

    fn summary(&self) -> String {
        // Copy the key values out first; formatting a nested bean takes its lock.
        let (bean_type, keys) = {
            let bean = self.read();
            let bean_type = Arc::clone(bean.bean_type());
            let keys: Vec<Option<Value>> = bean_type
                .key_members()
                .iter()
                .map(|key| bean.get(key).cloned())
                .collect();
            (bean_type, keys)
        };
        if keys.is_empty() {
            return format!("{}@{}", bean_type.name(), self.identity());
        }
        let parts: Vec<String> = bean_type
            .key_members()
            .iter()
            .zip(keys)
            .map(|(key, value)| match value {
                Some(value) => format!("{key}={}", value.shallow_display()),
                None => format!("{key}=<unset>"),
            })
            .collect();
        format!("{}{{{}}}", bean_type.name(), parts.join(", "))
    }
}

impl fmt::Debug for BeanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Members may point back at this bean, so only the header is printed.
        write!(f, "BeanRef({})", self.summary())
    }
}

/// A value whose structure is unknown to the built-in strategies.
pub struct OpaqueValue {
    type_name: String,
    payload: Box<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Box::new(payload),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the payload as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue({})", self.type_name)
    }
}

/// A node of an object graph.
///
/// Equality is total: floats compare by bit pattern, maps and sets ignore
/// ordering, beans compare by key members or identity, and opaque values
/// compare by identity.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bean(BeanRef),
    Seq(Vec<Value>),
    /// Keyed mapping in insertion order. Keys are unique.
    Map(Vec<(Value, Value)>),
    /// Unordered collection of unique elements, kept in insertion order.
    Set(Vec<Value>),
    Opaque(Arc<OpaqueValue>),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Build a map, keeping the first entry for a repeated key.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            if !out.iter().any(|(k, _)| *k == key) {
                out.push((key, value.into()));
            }
        }
        Self::Map(out)
    }

    /// Build a set, dropping repeated elements.
    pub fn set<T, I>(items: I) -> Self
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Self::Set(out)
    }

    pub fn seq<T, I>(items: I) -> Self
    where
        T: Into<Value>,
        I: IntoIterator<Item = T>,
    {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn opaque<T: Any + Send + Sync>(type_name: impl Into<String>, payload: T) -> Self {
        Self::Opaque(Arc::new(OpaqueValue::new(type_name, payload)))
    }

    /// Runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Text(_) => ValueType::Text,
            Self::Bean(bean) => ValueType::Bean(bean.bean_type().name().to_string()),
            Self::Seq(_) => ValueType::Seq,
            Self::Map(_) => ValueType::Map,
            Self::Set(_) => ValueType::Set,
            Self::Opaque(opaque) => ValueType::Opaque(opaque.type_name().to_string()),
        }
    }

    /// Identity of the value, if it has one. Only beans do.
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Self::Bean(bean) => Some(bean.identity()),
            _ => None,
        }
    }

    pub fn as_bean(&self) -> Option<&BeanRef> {
        match self {
            Self::Bean(bean) => Some(bean),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns `true` if this primitive equals its type's default
    /// (`false`, `0`, `0.0`, or the empty string). Non-primitives never do.
    pub fn is_default_primitive(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(t) => t.is_empty(),
            _ => false,
        }
    }

    /// Convert a JSON document. Objects become text-keyed maps; `null`
    /// becomes absence and is dropped from arrays and objects.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        use serde_json::Value as Json;
        match json {
            Json::Null => None,
            Json::Bool(b) => Some(Self::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Json::String(s) => Some(Self::Text(s.clone())),
            Json::Array(items) => Some(Self::Seq(items.iter().filter_map(Self::from_json).collect())),
            Json::Object(fields) => Some(Self::Map(
                fields
                    .iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (Self::Text(k.clone()), v)))
                    .collect(),
            )),
        }
    }

    /// Equality where nested beans compare by identity only.
    fn shallow_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Bean(a), Self::Bean(b)) => a.ptr_eq(b),
            (Self::Seq(a), Self::Seq(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.shallow_eq(y))
            }
            (Self::Set(a), Self::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.shallow_eq(y)))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(k2, v2)| k.shallow_eq(k2) && v.shallow_eq(v2))
                    })
            }
            _ => self == other,
        }
    }

    fn shallow_hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Bean(bean) => {
                std::mem::discriminant(self).hash(state);
                bean.identity().hash(state);
            }
            Self::Seq(items) => {
                std::mem::discriminant(self).hash(state);
                items.len().hash(state);
                for item in items {
                    item.shallow_hash(state);
                }
            }
            Self::Set(items) => {
                std::mem::discriminant(self).hash(state);
                unordered_hash(items.iter(), state, |item, h| item.shallow_hash(h));
            }
            Self::Map(entries) => {
                std::mem::discriminant(self).hash(state);
                unordered_hash(entries.iter(), state, |(k, v), h| {
                    k.shallow_hash(h);
                    v.shallow_hash(h);
                });
            }
            _ => self.hash(state),
        }
    }

    fn shallow_display(&self) -> String {
        match self {
            Self::Bean(bean) => format!("{}@{}", bean.bean_type().name(), bean.identity()),
            other => other.to_string(),
        }
    }
}

/// Order-insensitive hash: each element is hashed on its own and the
/// results are combined commutatively.
fn unordered_hash<'a, T: 'a, H: Hasher>(
    items: impl Iterator<Item = &'a T>,
    state: &mut H,
    mut hash_one: impl FnMut(&T, &mut DefaultHasher),
) {
    let mut combined = 0u64;
    let mut count = 0usize;
    for item in items {
        let mut hasher = DefaultHasher::new();
        hash_one(item, &mut hasher);
        combined = combined.wrapping_add(hasher.finish());
        count += 1;
    }
    count.hash(state);
    combined.hash(state);
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bean(a), Self::Bean(b)) => a.key_eq(b),
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a.len() == b.len() && a.iter().all(|x| b.contains(x)),
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Text(t) => t.hash(state),
            Self::Bean(bean) => bean.key_hash(state),
            Self::Seq(items) => items.hash(state),
            Self::Set(items) => unordered_hash(items.iter(), state, |item, h| item.hash(h)),
            Self::Map(entries) => unordered_hash(entries.iter(), state, |(k, v), h| {
                k.hash(h);
                v.hash(h);
            }),
            Self::Opaque(opaque) => (Arc::as_ptr(opaque) as *const () as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(t) => f.write_str(t),
            Self::Bean(bean) => f.write_str(&bean.summary()),
            Self::Seq(items) => {
                let parts: Vec<String> = items.iter().map(Value::shallow_display).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Set(items) => {
                let parts: Vec<String> = items.iter().map(Value::shallow_display).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Self::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.shallow_display(), v.shallow_display()))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Self::Opaque(opaque) => write!(f, "<{}>", opaque.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<BeanRef> for Value {
    fn from(bean: BeanRef) -> Self {
        Self::Bean(bean)
    }
}

impl From<Bean> for Value {
    fn from(bean: Bean) -> Self {
        Self::Bean(bean.into_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_type() -> Arc<BeanType> {
        BeanType::new("Person").keyed_by("id").member("name").shared()
    }

    fn node_type() -> Arc<BeanType> {
        BeanType::new("Node").member("id").member("reference").shared()
    }

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn bean_type_declares_key_as_member() {
        let ty = BeanType::new("T").member("a").keyed_by("id").member("a");
        assert_eq!(ty.member_names(), &["a".to_string(), "id".to_string()]);
        assert_eq!(ty.key_members(), &["id".to_string()]);
    }

    #[test]
    fn value_types() {
        assert_eq!(Value::from(1).value_type(), ValueType::Int);
        assert_eq!(Value::from("x").value_type(), ValueType::Text);
        let bean = Bean::new(person_type()).into_ref();
        assert_eq!(Value::from(bean).value_type(), ValueType::Bean("Person".into()));
        assert_eq!(Value::opaque("Handle", 7u32).value_type(), ValueType::Opaque("Handle".into()));
        assert!(ValueType::Float.is_primitive());
        assert!(!ValueType::Seq.is_primitive());
    }

    #[test]
    fn keyed_beans_compare_by_key() {
        let a = Bean::new(person_type()).with("id", "p1").with("name", "Ann").into_ref();
        let b = Bean::new(person_type()).with("id", "p1").with("name", "Bob").into_ref();
        let c = Bean::new(person_type()).with("id", "p2").with("name", "Ann").into_ref();

        assert_eq!(Value::from(a.clone()), Value::from(b.clone()));
        assert_eq!(hash_of(&a.clone().into()), hash_of(&b.into()));
        assert_ne!(Value::from(a), Value::from(c));
    }

    #[test]
    fn unkeyed_beans_compare_by_identity() {
        let a = Bean::new(node_type()).with("id", "a").into_ref();
        let b = Bean::new(node_type()).with("id", "a").into_ref();
        assert_ne!(Value::from(a.clone()), Value::from(b));
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_eq!(a.identity(), a.clone().identity());
    }

    #[test]
    fn cyclic_beans_compare_and_print() {
        let a = Bean::new(node_type()).with("id", "a").into_ref();
        let b = Bean::new(node_type()).with("id", "b").with("reference", a.clone()).into_ref();
        a.set("reference", b.clone());

        let va = Value::from(a.clone());
        assert_eq!(va, va.clone());
        assert!(format!("{va:?}").starts_with("BeanRef(Node@"));
        assert!(va.to_string().starts_with("Node@"));
    }

    #[test]
    fn floats_compare_by_bits() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn sets_and_maps_ignore_order() {
        let s1 = Value::set([1, 2, 3]);
        let s2 = Value::set([3, 1, 2]);
        assert_eq!(s1, s2);
        assert_eq!(hash_of(&s1), hash_of(&s2));

        let m1 = Value::map([("a", 1), ("b", 2)]);
        let m2 = Value::map([("b", 2), ("a", 1)]);
        assert_eq!(m1, m2);
        assert_eq!(hash_of(&m1), hash_of(&m2));

        assert_ne!(Value::seq([1, 2]), Value::seq([2, 1]));
    }

    #[test]
    fn constructors_deduplicate() {
        let Value::Set(items) = Value::set([1, 1, 2]) else { panic!("expected set") };
        assert_eq!(items.len(), 2);
        let Value::Map(entries) = Value::map([("a", 1), ("a", 2)]) else { panic!("expected map") };
        assert_eq!(entries, vec![(Value::from("a"), Value::from(1))]);
    }

    #[test]
    fn default_primitives() {
        assert!(Value::Int(0).is_default_primitive());
        assert!(Value::Bool(false).is_default_primitive());
        assert!(Value::text("").is_default_primitive());
        assert!(!Value::Int(5).is_default_primitive());
        assert!(!Value::seq(Vec::<Value>::new()).is_default_primitive());
    }

    #[test]
    fn opaque_values_downcast_and_compare_by_identity() {
        let v = Value::opaque("Handle", 42u32);
        let Value::Opaque(inner) = &v else { panic!("expected opaque") };
        assert_eq!(inner.downcast_ref::<u32>(), Some(&42));
        assert_eq!(inner.downcast_ref::<i64>(), None);
        assert_eq!(v, v.clone());
        assert_ne!(v, Value::opaque("Handle", 42u32));
    }

    #[test]
    fn from_json_converts_documents() {
        let doc = json!({"name": "x", "count": 3, "ratio": 0.5, "tags": ["a", null], "gone": null});
        let value = Value::from_json(&doc).unwrap();
        let Value::Map(entries) = &value else { panic!("expected map") };
        assert_eq!(entries.len(), 4);
        assert!(entries.contains(&(Value::from("count"), Value::Int(3))));
        assert!(entries.contains(&(Value::from("ratio"), Value::Float(0.5))));
        assert!(entries.contains(&(Value::from("tags"), Value::seq(["a"]))));
        assert!(Value::from_json(&json!(null)).is_none());
    }
}
