//! Member introspection: enumerating the comparable members of a bean type.
//!
//! The comparison engine never reads bean fields directly. It asks an
//! [`Introspector`] for the members of a [`BeanType`] and reads each one
//! through its getter, so computed or hidden members can be modelled by a
//! custom implementation.

use std::fmt;
use std::sync::Arc;

use crate::value::{Bean, BeanRef, BeanType, Value};

/// Reads a member from a bean.
pub type Getter = Arc<dyn Fn(&Bean) -> Option<Value> + Send + Sync>;

/// Writes a member on a bean.
pub type Setter = Arc<dyn Fn(&mut Bean, Value) + Send + Sync>;

/// A named, readable and optionally writable member of a bean type.
#[derive(Clone)]
pub struct Member {
    name: String,
    getter: Getter,
    setter: Option<Setter>,
}

impl Member {
    /// A member backed by the bean field of the same name.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        let get_name = name.clone();
        let set_name = name.clone();
        Self {
            name,
            getter: Arc::new(move |bean: &Bean| bean.get(&get_name).cloned()),
            setter: Some(Arc::new(move |bean: &mut Bean, value: Value| {
                bean.set(set_name.clone(), value)
            })),
        }
    }

    /// A member with a custom getter and no setter.
    pub fn read_only(
        name: impl Into<String>,
        getter: impl Fn(&Bean) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: None,
        }
    }

    /// A member with a custom getter and setter.
    pub fn read_write(
        name: impl Into<String>,
        getter: impl Fn(&Bean) -> Option<Value> + Send + Sync + 'static,
        setter: impl Fn(&mut Bean, Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: Some(Arc::new(setter)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read this member from a bean. `None` means the member is unset.
    pub fn read(&self, bean: &BeanRef) -> Option<Value> {
        let guard = bean.read();
        (self.getter)(&guard)
    }

    /// Write this member on a bean. Returns `false` for read-only members.
    pub fn write(&self, bean: &BeanRef, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                let mut guard = bean.write();
                setter(&mut guard, value);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Enumerates the comparable members of a bean type.
///
/// Implementations must return members in a stable order; the engine
/// creates child nodes in that order.
pub trait Introspector: Send + Sync {
    /// All comparable members of `bean_type`.
    fn members(&self, bean_type: &BeanType) -> Vec<Member>;

    /// The member called `name`, if `bean_type` has one.
    fn member(&self, bean_type: &BeanType, name: &str) -> Option<Member> {
        self.members(bean_type).into_iter().find(|m| m.name() == name)
    }
}

/// The default introspector: one field-backed member per declared name.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclaredMembers;

impl Introspector for DeclaredMembers {
    fn members(&self, bean_type: &BeanType) -> Vec<Member> {
        bean_type.member_names().iter().map(Member::field).collect()
    }
}
