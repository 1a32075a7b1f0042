use crate::container::{Component, ComponentFactory};
use crate::gateway::{GatewayFactory, GatewayType};
use crate::record::{Record, RecordType};
use crate::router::HandlerGroup;
use std::fmt;

/// Declarative classification tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Record,
    Gateway,
    Service,
    HandlerGroup,
    Helper,
}

impl Tag {
    /// Classification precedence.
    pub const PRECEDENCE: [Tag; 5] = [
        Tag::Record,
        Tag::Gateway,
        Tag::Service,
        Tag::HandlerGroup,
        Tag::Helper,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Record => "record",
            Tag::Gateway => "gateway",
            Tag::Service => "service",
            Tag::HandlerGroup => "handler-group",
            Tag::Helper => "helper",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a registry entry can be resolved to.
#[derive(Clone, Debug)]
pub enum Declaration {
    Record(RecordType),
    Gateway(GatewayType, GatewayFactory),
    Component(ComponentFactory),
    /// A known type with no resolvable declaration (e.g. a plain helper struct).
    Opaque,
}

/// One declared type: qualified name, tags and declaration.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    pub name: String,
    pub tags: Vec<Tag>,
    pub declaration: Declaration,
}

impl TypeEntry {
    pub fn record<T: Record>() -> Self {
        TypeEntry {
            name: T::NAME.to_string(),
            tags: vec![Tag::Record],
            declaration: Declaration::Record(T::record_type()),
        }
    }

    pub fn gateway<T: Record>(name: impl Into<String>) -> Self {
        let ty = GatewayType::of::<T>(name);
        TypeEntry {
            name: ty.name.clone(),
            tags: vec![Tag::Gateway],
            declaration: Declaration::Gateway(ty, GatewayFactory::of::<T>()),
        }
    }

    pub fn service<S: Component + Default>() -> Self {
        Self::component(ComponentFactory::of::<S>(), Tag::Service)
    }

    pub fn helper<H: Component + Default>() -> Self {
        Self::component(ComponentFactory::of::<H>(), Tag::Helper)
    }

    pub fn handler_group<C: HandlerGroup + Default>() -> Self {
        Self::component(ComponentFactory::handler_group::<C>(), Tag::HandlerGroup)
    }

    /// A type carrying no tag. The scanner lists it but classifies it nowhere.
    pub fn untagged(name: impl Into<String>) -> Self {
        TypeEntry {
            name: name.into(),
            tags: Vec::new(),
            declaration: Declaration::Opaque,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    fn component(factory: ComponentFactory, tag: Tag) -> Self {
        TypeEntry {
            name: factory.name.to_string(),
            tags: vec![tag],
            declaration: Declaration::Component(factory),
        }
    }
}

/// Ordered list of declared types, built explicitly at startup.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: Vec<TypeEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T: Record>(self) -> Self {
        self.entry(TypeEntry::record::<T>())
    }

    /// Register `Gateway<T>` under its default name.
    pub fn gateway<T: Record>(self) -> Self {
        self.entry(TypeEntry::gateway::<T>(GatewayType::default_name::<T>()))
    }

    pub fn gateway_named<T: Record>(self, name: impl Into<String>) -> Self {
        self.entry(TypeEntry::gateway::<T>(name))
    }

    pub fn service<S: Component + Default>(self) -> Self {
        self.entry(TypeEntry::service::<S>())
    }

    pub fn helper<H: Component + Default>(self) -> Self {
        self.entry(TypeEntry::helper::<H>())
    }

    pub fn handler_group<C: HandlerGroup + Default>(self) -> Self {
        self.entry(TypeEntry::handler_group::<C>())
    }

    pub fn entry(mut self, entry: TypeEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }
}
