//! Data-access gateways: the five canonical operation shapes and the generic
//! `Gateway<T>` that forwards them to the entity store.

use crate::error::{AppError, ConfigError};
use crate::record::Record;
use crate::store::EntityStore;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Parameter or return shape of a gateway method, independent of the record type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Id,
    Record,
    Records,
    Unit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodShape {
    pub name: &'static str,
    pub params: Vec<Shape>,
    pub returns: Shape,
}

impl fmt::Display for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) -> {:?}", self.name, self.params, self.returns)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanonicalOp {
    Get,
    GetAll,
    Add,
    Update,
    Delete,
}

impl CanonicalOp {
    pub const ALL: [CanonicalOp; 5] = [
        CanonicalOp::Get,
        CanonicalOp::GetAll,
        CanonicalOp::Add,
        CanonicalOp::Update,
        CanonicalOp::Delete,
    ];

    pub fn shape(self) -> MethodShape {
        let (name, params, returns) = match self {
            CanonicalOp::Get => ("get", vec![Shape::Id], Shape::Record),
            CanonicalOp::GetAll => ("get_all", vec![], Shape::Records),
            CanonicalOp::Add => ("add", vec![Shape::Record], Shape::Unit),
            CanonicalOp::Update => ("update", vec![Shape::Id, Shape::Record], Shape::Unit),
            CanonicalOp::Delete => ("delete", vec![Shape::Id], Shape::Unit),
        };
        MethodShape {
            name,
            params,
            returns,
        }
    }
}

/// Declared gateway: its name, associated record and method shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayType {
    pub name: String,
    pub record: &'static str,
    pub methods: Vec<MethodShape>,
}

impl GatewayType {
    /// Descriptor of `Gateway<T>`, which implements every canonical shape.
    pub fn of<T: Record>(name: impl Into<String>) -> Self {
        GatewayType {
            name: name.into(),
            record: T::NAME,
            methods: CanonicalOp::ALL.iter().map(|op| op.shape()).collect(),
        }
    }

    /// Name used when a gateway is registered without an explicit one.
    pub fn default_name<T: Record>() -> String {
        format!("{}Gateway", T::NAME)
    }

    /// Every canonical operation must be present with its exact shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for op in CanonicalOp::ALL {
            let want = op.shape();
            if !self.methods.iter().any(|m| *m == want) {
                return Err(ConfigError::GatewayShape {
                    gateway: self.name.clone(),
                    operation: want.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Builds the `Gateway<T>` instance handed to dependent components.
#[derive(Clone, Copy)]
pub struct GatewayFactory {
    pub type_id: TypeId,
    pub type_name: &'static str,
    build: fn(String, Arc<EntityStore>) -> Arc<dyn Any + Send + Sync>,
}

impl GatewayFactory {
    pub fn of<T: Record>() -> Self {
        fn build<T: Record>(name: String, store: Arc<EntityStore>) -> Arc<dyn Any + Send + Sync> {
            Arc::new(Gateway::<T>::new(name, store))
        }
        GatewayFactory {
            type_id: TypeId::of::<Gateway<T>>(),
            type_name: std::any::type_name::<Gateway<T>>(),
            build: build::<T>,
        }
    }

    pub fn build(&self, name: String, store: Arc<EntityStore>) -> Arc<dyn Any + Send + Sync> {
        (self.build)(name, store)
    }
}

impl fmt::Debug for GatewayFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayFactory")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Generic data-access gateway bound to one record type.
pub struct Gateway<T: Record> {
    name: String,
    store: Arc<EntityStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Gateway<T> {
    pub fn new(name: impl Into<String>, store: Arc<EntityStore>) -> Self {
        Gateway {
            name: name.into(),
            store,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, id: i64) -> Result<Option<T>, AppError> {
        self.store
            .get_by_id(&self.name, id)?
            .map(|inst| inst.to_record())
            .transpose()
    }

    pub fn get_all(&self) -> Result<Vec<T>, AppError> {
        self.store
            .get_all(&self.name)?
            .iter()
            .map(|inst| inst.to_record())
            .collect()
    }

    pub fn add(&self, entity: &T) -> Result<i64, AppError> {
        self.store.add(&self.name, entity)
    }

    pub fn update(&self, id: i64, entity: &T) -> Result<(), AppError> {
        self.store.update(&self.name, id, entity)
    }

    pub fn delete(&self, id: i64) -> Result<(), AppError> {
        self.store.delete(&self.name, id)
    }
}
