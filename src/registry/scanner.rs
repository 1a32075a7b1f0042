use crate::container::ComponentFactory;
use crate::error::ConfigError;
use crate::gateway::{GatewayFactory, GatewayType};
use crate::record::RecordType;
use crate::registry::types::{Declaration, Registry, Tag, TypeEntry};
use std::collections::HashSet;
use std::sync::OnceLock;

/// The five disjoint role lists plus every type name seen, in registry order.
#[derive(Clone, Debug, Default)]
pub struct ScanResult {
    pub records: Vec<RecordType>,
    pub gateways: Vec<(GatewayType, GatewayFactory)>,
    pub services: Vec<ComponentFactory>,
    pub helpers: Vec<ComponentFactory>,
    pub handler_groups: Vec<ComponentFactory>,
    pub all: Vec<String>,
}

impl ScanResult {
    pub fn classified(&self) -> usize {
        self.records.len()
            + self.gateways.len()
            + self.services.len()
            + self.helpers.len()
            + self.handler_groups.len()
    }
}

/// Classifies registry entries under a root namespace. Scans once; later calls
/// return the cached result.
pub struct Scanner {
    registry: Registry,
    root: String,
    cache: OnceLock<ScanResult>,
}

impl Scanner {
    /// `root` is a qualified-name prefix such as `my_app` or `my_app::domain`.
    /// An empty root accepts every entry.
    pub fn new(registry: Registry, root: impl Into<String>) -> Self {
        Scanner {
            registry,
            root: root.into(),
            cache: OnceLock::new(),
        }
    }

    pub fn scan(&self) -> Result<&ScanResult, ConfigError> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        let result = self.classify_all()?;
        Ok(self.cache.get_or_init(|| result))
    }

    fn classify_all(&self) -> Result<ScanResult, ConfigError> {
        let mut out = ScanResult::default();
        let mut seen = HashSet::new();
        for entry in self.registry.entries() {
            if !in_namespace(&self.root, &entry.name) {
                continue;
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateType(entry.name.clone()));
            }
            out.all.push(entry.name.clone());
            classify(entry, &mut out)?;
        }
        tracing::info!(
            root = %self.root,
            types = out.all.len(),
            records = out.records.len(),
            gateways = out.gateways.len(),
            services = out.services.len(),
            helpers = out.helpers.len(),
            handler_groups = out.handler_groups.len(),
            "scan complete"
        );
        Ok(out)
    }
}

fn in_namespace(root: &str, name: &str) -> bool {
    root.is_empty()
        || name == root
        || name
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with("::"))
}

fn classify(entry: &TypeEntry, out: &mut ScanResult) -> Result<(), ConfigError> {
    let Some(tag) = Tag::PRECEDENCE.into_iter().find(|t| entry.tags.contains(t)) else {
        tracing::debug!(entry = %entry.name, "no classifying tag, skipped");
        return Ok(());
    };
    if entry.tags.len() > 1 {
        tracing::warn!(entry = %entry.name, chosen = %tag, "type carries more than one classifying tag");
    }

    let unresolvable = || ConfigError::Unresolvable {
        entry: entry.name.clone(),
        role: tag.as_str(),
    };
    match (tag, &entry.declaration) {
        (Tag::Record, Declaration::Record(rt)) => out.records.push(rt.clone()),
        (Tag::Gateway, Declaration::Gateway(ty, factory)) => out.gateways.push((ty.clone(), *factory)),
        (Tag::Service, Declaration::Component(f)) if !f.has_routes() => out.services.push(*f),
        (Tag::Helper, Declaration::Component(f)) if !f.has_routes() => out.helpers.push(*f),
        (Tag::HandlerGroup, Declaration::Component(f)) if f.has_routes() => out.handler_groups.push(*f),
        _ => return Err(unresolvable()),
    }
    tracing::debug!(entry = %entry.name, role = %tag, "classified");
    Ok(())
}
