//! Spy creation, installation on objects, and restoration.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use vouch_equality::MatchersUtil;
use vouch_value::{
    empty_spy_set, invalid_spy_target, Accessor, EngineResult, FunctionValue, Value,
};

use crate::spy::{Spy, SpyStrategy};

/// Run-wide default configuration applied to every new spy.
///
/// ```text
/// registry.set_default_strategy(Arc::new(|and| { and.return_value(42); }));
/// ```
pub type DefaultStrategy = Arc<dyn Fn(&SpyStrategy) + Send + Sync>;

/// Members (or properties) of a spy object.
#[derive(Clone, Debug)]
pub enum SpyObjMembers {
    /// Plain spies.
    Names(Vec<String>),
    /// Spies returning a fixed value.
    Returns(Vec<(String, Value)>),
}

impl SpyObjMembers {
    fn is_empty(&self) -> bool {
        match self {
            SpyObjMembers::Names(names) => names.is_empty(),
            SpyObjMembers::Returns(pairs) => pairs.is_empty(),
        }
    }
}

impl Default for SpyObjMembers {
    fn default() -> Self {
        SpyObjMembers::Names(Vec::new())
    }
}

impl<S: Into<String>> FromIterator<S> for SpyObjMembers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        SpyObjMembers::Names(iter.into_iter().map(Into::into).collect())
    }
}

/// Which half of an accessor property to spy on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Get,
    Set,
}

impl AccessType {
    fn slot(self, accessor: &mut Accessor) -> &mut Option<FunctionValue> {
        match self {
            AccessType::Get => &mut accessor.get,
            AccessType::Set => &mut accessor.set,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AccessType::Get => "get",
            AccessType::Set => "set",
        }
    }
}

/// What a spy displaced, to be put back on restore.
enum Displaced {
    Method(Value),
    Property(Accessor),
}

/// A spy installed by [`SpyRegistry::spy_on`] or
/// [`SpyRegistry::spy_on_property`].
struct Installed {
    target: Value,
    key: String,
    displaced: Displaced,
}

/// Creates spies and tracks the ones installed on objects.
///
/// Clones share state: the invocation ordinal, the default strategy and the
/// list of installed spies.
#[derive(Clone)]
pub struct SpyRegistry {
    equality: MatchersUtil,
    ordinal: Arc<AtomicU64>,
    default_strategy: Arc<RwLock<Option<DefaultStrategy>>>,
    installed: Arc<Mutex<Vec<Installed>>>,
}

impl SpyRegistry {
    /// `equality` is used to match `with_args` scopes.
    pub fn new(equality: MatchersUtil) -> Self {
        SpyRegistry {
            equality,
            ordinal: Arc::default(),
            default_strategy: Arc::default(),
            installed: Arc::default(),
        }
    }

    /// New spy named `name`, optionally standing in for `original`.
    pub fn create_spy(&self, name: impl Into<String>, original: Option<FunctionValue>) -> Spy {
        let spy = Spy::new(
            name,
            original,
            self.equality.clone(),
            Arc::clone(&self.ordinal),
        );
        if let Some(apply) = self.default_strategy.read().clone() {
            apply(&spy.and());
        }
        tracing::debug!(spy = spy.name(), "spy created");
        spy
    }

    /// Object whose members are independent spies named `base.member`.
    ///
    /// Each of `properties` becomes an accessor whose getter and setter are
    /// spies named `base.prop.get` and `base.prop.set`; with a value given,
    /// both return it, so assignments leave the read value unchanged.
    pub fn create_spy_obj(
        &self,
        base: &str,
        members: SpyObjMembers,
        properties: SpyObjMembers,
    ) -> EngineResult<Value> {
        if members.is_empty() && properties.is_empty() {
            return Err(empty_spy_set(base));
        }
        let member_name = |member: &str| {
            if base.is_empty() {
                member.to_string()
            } else {
                format!("{base}.{member}")
            }
        };
        let properties: Vec<(String, Option<Value>)> = match properties {
            SpyObjMembers::Names(names) => names.into_iter().map(|n| (n, None)).collect(),
            SpyObjMembers::Returns(pairs) => {
                pairs.into_iter().map(|(n, v)| (n, Some(v))).collect()
            }
        };
        let fields: Vec<(String, Value)> = match members {
            SpyObjMembers::Names(names) => names
                .into_iter()
                .map(|name| {
                    let spy = self.create_spy(member_name(&name), None);
                    (name, spy.as_value())
                })
                .collect(),
            SpyObjMembers::Returns(pairs) => pairs
                .into_iter()
                .map(|(name, value)| {
                    let spy = self.create_spy(member_name(&name), None);
                    spy.and().return_value(value);
                    (name, spy.as_value())
                })
                .collect(),
        };
        let obj = Value::object(fields);
        for (name, value) in properties {
            let get = self.create_spy(format!("{}.get", member_name(&name)), None);
            let set = self.create_spy(format!("{}.set", member_name(&name)), None);
            if let Some(value) = value {
                get.and().return_value(value.clone());
                set.and().return_value(value);
            }
            obj.define_accessor(
                name,
                Accessor {
                    get: Some(FunctionValue::new(get)),
                    set: Some(FunctionValue::new(set)),
                },
            );
        }
        Ok(obj)
    }

    /// Replace `target.method` with a spy; the original is kept for
    /// `call_through` and put back by [`SpyRegistry::restore_all_spies`].
    pub fn spy_on(&self, target: &Value, method: &str) -> EngineResult<Spy> {
        if !matches!(target, Value::Object(_)) {
            return Err(invalid_spy_target(format!(
                "could not find an object to spy upon for {method}()"
            )));
        }
        if target.accessor(method).is_some() {
            return Err(invalid_spy_target(format!(
                "{method} is an accessor property; use spy_on_property"
            )));
        }
        let Some(current) = target.get(method) else {
            return Err(invalid_spy_target(format!("{method}() method does not exist")));
        };
        let Some(original) = current.as_function().cloned() else {
            return Err(invalid_spy_target(format!(
                "{method} is not declared writable or has no setter"
            )));
        };
        if Spy::from_value(&current).is_some() {
            return Err(invalid_spy_target(format!(
                "{method} has already been spied upon"
            )));
        }

        let spy = self.create_spy(method, Some(original));
        target.set_field(method, spy.as_value());
        self.installed.lock().push(Installed {
            target: target.clone(),
            key: method.to_string(),
            displaced: Displaced::Method(current),
        });
        tracing::debug!(method, "spy installed");
        Ok(spy)
    }

    /// Replace the getter or setter of accessor `property` with a spy. The
    /// original accessor function is kept for `call_through` and put back by
    /// [`SpyRegistry::restore_all_spies`].
    pub fn spy_on_property(
        &self,
        target: &Value,
        property: &str,
        access: AccessType,
    ) -> EngineResult<Spy> {
        if !matches!(target, Value::Object(_)) {
            return Err(invalid_spy_target(format!(
                "could not find an object to spy upon for {property}"
            )));
        }
        let Some(original) = target.accessor(property) else {
            return Err(invalid_spy_target(format!(
                "{property} property does not exist or is not an accessor"
            )));
        };
        let mut replaced = original.clone();
        let slot = access.slot(&mut replaced);
        let Some(current) = slot.clone() else {
            return Err(invalid_spy_target(format!(
                "Property {property} does not have access type {}",
                access.as_str()
            )));
        };
        if current.downcast::<Spy>().is_some() {
            return Err(invalid_spy_target(format!(
                "{property} has already been spied upon"
            )));
        }

        let spy = self.create_spy(property, Some(current));
        *slot = Some(FunctionValue::new(spy.clone()));
        target.define_accessor(property, replaced);
        self.installed.lock().push(Installed {
            target: target.clone(),
            key: property.to_string(),
            displaced: Displaced::Property(original),
        });
        tracing::debug!(property, access = access.as_str(), "property spy installed");
        Ok(spy)
    }

    /// Spy on every function-valued property of `target` not yet spied on.
    pub fn spy_on_all_functions(&self, target: &Value) -> EngineResult<Vec<Spy>> {
        let Value::Object(obj) = target else {
            return Err(invalid_spy_target(
                "spy_on_all_functions could not find an object to spy upon",
            ));
        };
        let methods: Vec<String> = obj
            .read()
            .fields
            .iter()
            .filter(|(_, v)| v.as_function().is_some() && Spy::from_value(v).is_none())
            .map(|(k, _)| k.clone())
            .collect();
        methods
            .iter()
            .map(|method| self.spy_on(target, method))
            .collect()
    }

    /// Put every installed spy's original back, most recent first.
    pub fn restore_all_spies(&self) {
        let installed = std::mem::take(&mut *self.installed.lock());
        let count = installed.len();
        for entry in installed.into_iter().rev() {
            match entry.displaced {
                Displaced::Method(original) => {
                    entry.target.set_field(entry.key, original);
                }
                Displaced::Property(original) => {
                    entry.target.define_accessor(entry.key, original);
                }
            }
        }
        if count > 0 {
            tracing::debug!(count, "spies restored");
        }
    }

    pub fn installed_count(&self) -> usize {
        self.installed.lock().len()
    }

    pub fn set_default_strategy(&self, strategy: DefaultStrategy) {
        *self.default_strategy.write() = Some(strategy);
    }

    /// Back to record-only for new spies.
    pub fn reset_default_strategy(&self) {
        *self.default_strategy.write() = None;
    }

    /// Restore installed spies and drop the default strategy.
    pub fn reset(&self) {
        self.restore_all_spies();
        self.reset_default_strategy();
    }
}

impl Default for SpyRegistry {
    fn default() -> Self {
        SpyRegistry::new(MatchersUtil::default())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
