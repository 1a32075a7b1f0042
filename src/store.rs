//! In-memory entity store: one table per record type, keyed by the record's qualified name.
//! Every operation runs under the store lock; reads hand out snapshots.

use crate::error::{AppError, ConfigError};
use crate::gateway::GatewayType;
use crate::record::{FieldSource, FieldValue, Record, RecordType};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A live (or transient) object of some record type. Values follow the record's field order.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    record: Arc<RecordType>,
    values: Vec<FieldValue>,
}

impl Instance {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.record.field_index(name).map(|i| &self.values[i])
    }

    /// Value of the identifier field (`0` for transient instances).
    pub fn id(&self) -> Option<i64> {
        self.record
            .fields
            .iter()
            .position(|f| f.identifier)
            .and_then(|i| self.values[i].as_long())
    }

    pub fn to_record<T: Record>(&self) -> Result<T, AppError> {
        T::from_source(self)
    }
}

impl FieldSource for Instance {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.record.fields.iter().zip(&self.values) {
            map.serialize_entry(field.name, value)?;
        }
        map.end()
    }
}

struct Table {
    record: Arc<RecordType>,
    id_index: usize,
    rows: Vec<Instance>,
}

impl Table {
    fn position(&self, id: i64) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.values[self.id_index].as_long() == Some(id))
    }

    /// Non-identifier values copied from `source` by descriptor; identifier slot holds `id`.
    fn copy_from(&self, source: &dyn FieldSource, id: i64) -> Result<Vec<FieldValue>, AppError> {
        let mut values = Vec::with_capacity(self.record.fields.len());
        for field in &self.record.fields {
            if field.identifier {
                values.push(FieldValue::Long(id));
                continue;
            }
            let value = source.field(field.name).ok_or_else(|| AppError::FieldMapping {
                record: self.record.name.to_string(),
                detail: format!("source has no field {}", field.name),
            })?;
            if value.field_type() != field.ty {
                return Err(AppError::FieldMapping {
                    record: self.record.name.to_string(),
                    detail: format!(
                        "field {} expects {}, source holds {}",
                        field.name,
                        field.ty,
                        value.field_type()
                    ),
                });
            }
            values.push(value);
        }
        Ok(values)
    }
}

struct StoreState {
    tables: HashMap<&'static str, Table>,
    /// gateway name -> record name
    gateways: HashMap<String, &'static str>,
    next_id: i64,
}

impl StoreState {
    fn table(&self, gateway: &str) -> Result<&Table, AppError> {
        let record = self.record_of(gateway)?;
        self.tables
            .get(record)
            .ok_or_else(|| AppError::NotFound(format!("table for record {}", record)))
    }

    fn table_mut(&mut self, gateway: &str) -> Result<&mut Table, AppError> {
        let record = self.record_of(gateway)?;
        self.tables
            .get_mut(record)
            .ok_or_else(|| AppError::NotFound(format!("table for record {}", record)))
    }

    fn record_of(&self, gateway: &str) -> Result<&'static str, AppError> {
        self.gateways
            .get(gateway)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("gateway {}", gateway)))
    }
}

pub struct EntityStore {
    state: RwLock<StoreState>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        EntityStore {
            state: RwLock::new(StoreState {
                tables: HashMap::new(),
                gateways: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, AppError> {
        self.state.read().map_err(|_| AppError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, AppError> {
        self.state.write().map_err(|_| AppError::LockPoisoned)
    }

    /// Startup-only access; nothing else holds the lock yet.
    fn startup(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate the identifier invariant and create an empty table for the record.
    pub fn define_table(&self, record: RecordType) -> Result<(), ConfigError> {
        let id_name = record.identifier()?.name;
        let id_index = record.field_index(id_name).unwrap_or_default();
        let mut state = self.startup();
        if state.tables.contains_key(record.name) {
            return Err(ConfigError::DuplicateTable(record.name.to_string()));
        }
        tracing::info!(record = record.name, table = record.table, "defined table");
        state.tables.insert(
            record.name,
            Table {
                record: Arc::new(record),
                id_index,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    /// Validate the gateway's canonical shapes and associate it with its record.
    pub fn register_gateway(&self, gateway: &GatewayType) -> Result<(), ConfigError> {
        gateway.validate()?;
        let mut state = self.startup();
        if !state.tables.contains_key(gateway.record) {
            return Err(ConfigError::UnknownRecord {
                gateway: gateway.name.clone(),
                record: gateway.record.to_string(),
            });
        }
        if state.gateways.contains_key(&gateway.name)
            || state.gateways.values().any(|r| *r == gateway.record)
        {
            return Err(ConfigError::DuplicateGateway {
                gateway: gateway.name.clone(),
                record: gateway.record.to_string(),
            });
        }
        tracing::info!(gateway = %gateway.name, record = gateway.record, "registered gateway");
        state.gateways.insert(gateway.name.clone(), gateway.record);
        Ok(())
    }

    /// Insert a fresh instance copied from `source`; returns the assigned surrogate key.
    pub fn add(&self, gateway: &str, source: &dyn FieldSource) -> Result<i64, AppError> {
        let mut state = self.write()?;
        let id = state.next_id;
        let table = state.table_mut(gateway)?;
        let values = table.copy_from(source, id)?;
        table.rows.push(Instance {
            record: table.record.clone(),
            values,
        });
        tracing::debug!(gateway, id, "added instance");
        state.next_id += 1;
        Ok(id)
    }

    pub fn get_by_id(&self, gateway: &str, id: i64) -> Result<Option<Instance>, AppError> {
        let state = self.read()?;
        let table = state.table(gateway)?;
        Ok(table.position(id).map(|i| table.rows[i].clone()))
    }

    /// Snapshot of the table in insertion order.
    pub fn get_all(&self, gateway: &str) -> Result<Vec<Instance>, AppError> {
        let state = self.read()?;
        Ok(state.table(gateway)?.rows.clone())
    }

    /// Overwrite every non-identifier field of the instance with the given id.
    pub fn update(&self, gateway: &str, id: i64, source: &dyn FieldSource) -> Result<(), AppError> {
        let mut state = self.write()?;
        let table = state.table_mut(gateway)?;
        let pos = table
            .position(id)
            .ok_or_else(|| AppError::NotFound(format!("{} with id {}", table.record.name, id)))?;
        let values = table.copy_from(source, id)?;
        table.rows[pos].values = values;
        tracing::debug!(gateway, id, "updated instance");
        Ok(())
    }

    /// Remove the instance with the given id. Absent ids are ignored.
    pub fn delete(&self, gateway: &str, id: i64) -> Result<(), AppError> {
        let mut state = self.write()?;
        let table = state.table_mut(gateway)?;
        if let Some(pos) = table.position(id) {
            table.rows.remove(pos);
            tracing::debug!(gateway, id, "deleted instance");
        }
        Ok(())
    }

    /// Build a transient instance of `record` from raw strings keyed by field name.
    /// The key set must equal the record's non-identifier field names.
    pub fn create_from_field_map(
        &self,
        record: &str,
        fields: &HashMap<String, String>,
    ) -> Result<Instance, AppError> {
        let rt = {
            let state = self.read()?;
            state
                .tables
                .get(record)
                .map(|t| t.record.clone())
                .ok_or_else(|| AppError::FieldMapping {
                    record: record.to_string(),
                    detail: "record has no defined table".into(),
                })?
        };

        let expected: BTreeSet<&str> = rt.data_fields().map(|f| f.name).collect();
        let actual: BTreeSet<&str> = fields.keys().map(String::as_str).collect();
        if expected != actual {
            let missing: Vec<&str> = expected.difference(&actual).copied().collect();
            let extra: Vec<&str> = actual.difference(&expected).copied().collect();
            return Err(AppError::FieldMapping {
                record: record.to_string(),
                detail: format!("missing fields {:?}, unexpected fields {:?}", missing, extra),
            });
        }

        let mut values = Vec::with_capacity(rt.fields.len());
        for field in &rt.fields {
            let value = if field.identifier {
                FieldValue::Long(0)
            } else {
                match fields.get(field.name) {
                    Some(raw) => field.ty.parse(field.name, raw)?,
                    None => field.ty.zero(),
                }
            };
            values.push(value);
        }
        Ok(Instance { record: rt, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldDescriptor, FieldType};

    crate::record! {
        pub struct Employee in "employees" {
            #[id] id: Long,
            name: String,
            email: String,
        }
    }

    crate::record! {
        pub struct Article in "articles" {
            #[id] id: Long,
            title: String,
            pages: Integer,
            published: Boolean,
        }
    }

    const EMPLOYEES: &str = "store::EmployeeGateway";
    const ARTICLES: &str = "store::ArticleGateway";

    fn store() -> EntityStore {
        let store = EntityStore::new();
        store.define_table(Employee::record_type()).unwrap();
        store.define_table(Article::record_type()).unwrap();
        store.register_gateway(&GatewayType::of::<Employee>(EMPLOYEES)).unwrap();
        store.register_gateway(&GatewayType::of::<Article>(ARTICLES)).unwrap();
        store
    }

    fn employee(name: &str, email: &str) -> Employee {
        Employee {
            id: 0,
            name: name.into(),
            email: email.into(),
        }
    }

    #[test]
    fn new_table_is_empty() {
        let store = store();
        assert!(store.get_all(EMPLOYEES).unwrap().is_empty());
    }

    #[test]
    fn define_table_rejects_bad_identifier() {
        let store = EntityStore::new();
        let rt = RecordType::new(
            "t::Plain",
            "plain",
            vec![FieldDescriptor { name: "name", ty: FieldType::String, identifier: false }],
        );
        assert!(matches!(store.define_table(rt), Err(ConfigError::MissingIdentifier { .. })));

        let rt = RecordType::new(
            "t::IntId",
            "int_id",
            vec![FieldDescriptor { name: "id", ty: FieldType::Integer, identifier: true }],
        );
        assert!(matches!(store.define_table(rt), Err(ConfigError::IdentifierType { .. })));
    }

    #[test]
    fn define_table_twice_fails() {
        let store = store();
        assert!(matches!(
            store.define_table(Employee::record_type()),
            Err(ConfigError::DuplicateTable(_))
        ));
    }

    #[test]
    fn gateway_needs_defined_record() {
        let store = EntityStore::new();
        let err = store.register_gateway(&GatewayType::of::<Employee>(EMPLOYEES)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRecord { .. }));
    }

    #[test]
    fn second_gateway_for_record_fails() {
        let store = store();
        let err = store
            .register_gateway(&GatewayType::of::<Employee>("store::OtherGateway"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateGateway { .. }));
    }

    #[test]
    fn ids_increase_across_deletes_and_tables() {
        let store = store();
        let a = store.add(EMPLOYEES, &employee("A", "a@x")).unwrap();
        let b = store.add(EMPLOYEES, &employee("B", "b@x")).unwrap();
        store.delete(EMPLOYEES, b).unwrap();
        let article = Article { id: 0, title: "T".into(), pages: 3, published: false };
        let c = store.add(ARTICLES, &article).unwrap();
        let d = store.add(EMPLOYEES, &employee("D", "d@x")).unwrap();
        assert_eq!(vec![a, b, c, d], vec![1, 2, 3, 4]);
    }

    #[test]
    fn add_then_get_copies_fields() {
        let store = store();
        let src = employee("Ann", "a@x.com");
        let id = store.add(EMPLOYEES, &src).unwrap();
        let got: Employee = store.get_by_id(EMPLOYEES, id).unwrap().unwrap().to_record().unwrap();
        assert_eq!(got.id, id);
        assert_eq!(got.name, src.name);
        assert_eq!(got.email, src.email);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = store();
        let id = store.add(EMPLOYEES, &employee("Ann", "a@x.com")).unwrap();
        store.delete(EMPLOYEES, id).unwrap();
        assert!(store.get_by_id(EMPLOYEES, id).unwrap().is_none());
        store.delete(EMPLOYEES, id).unwrap();
        store.delete(EMPLOYEES, 999).unwrap();
    }

    #[test]
    fn update_keeps_identifier() {
        let store = store();
        let id = store.add(EMPLOYEES, &employee("Ann", "a@x.com")).unwrap();
        let mut changed = employee("Anna", "anna@x.com");
        changed.id = 77;
        store.update(EMPLOYEES, id, &changed).unwrap();
        let got = store.get_by_id(EMPLOYEES, id).unwrap().unwrap();
        assert_eq!(got.id(), Some(id));
        assert_eq!(got.get("name"), Some(&FieldValue::String("Anna".into())));
        assert!(store.get_by_id(EMPLOYEES, 77).unwrap().is_none());
    }

    #[test]
    fn update_absent_id_is_not_found() {
        let store = store();
        let err = store.update(EMPLOYEES, 5, &employee("X", "x")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn get_all_is_a_snapshot_in_insertion_order() {
        let store = store();
        store.add(EMPLOYEES, &employee("A", "a")).unwrap();
        store.add(EMPLOYEES, &employee("B", "b")).unwrap();
        let snapshot = store.get_all(EMPLOYEES).unwrap();
        store.add(EMPLOYEES, &employee("C", "c")).unwrap();
        store.delete(EMPLOYEES, 1).unwrap();
        let names: Vec<_> = snapshot.iter().map(|i| i.get("name").cloned()).collect();
        assert_eq!(
            names,
            vec![Some(FieldValue::String("A".into())), Some(FieldValue::String("B".into()))]
        );
        assert_eq!(store.get_all(EMPLOYEES).unwrap().len(), 2);
    }

    #[test]
    fn unknown_gateway_is_request_error() {
        let store = store();
        assert!(matches!(store.get_all("nope"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn field_map_must_match_exactly() {
        let store = store();
        let mut map = HashMap::new();
        map.insert("name".to_string(), "Ann".to_string());
        let err = store.create_from_field_map(Employee::NAME, &map).unwrap_err();
        assert!(matches!(err, AppError::FieldMapping { .. }));

        map.insert("email".to_string(), "a@x.com".to_string());
        map.insert("salary".to_string(), "10".to_string());
        assert!(store.create_from_field_map(Employee::NAME, &map).is_err());

        map.remove("salary");
        let inst = store.create_from_field_map(Employee::NAME, &map).unwrap();
        assert_eq!(inst.id(), Some(0));
        assert_eq!(inst.get("email"), Some(&FieldValue::String("a@x.com".into())));
    }

    #[test]
    fn field_map_converts_primitives() {
        let store = store();
        let map: HashMap<String, String> = [("title", "Rust"), ("pages", "120"), ("published", "TRUE")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let article: Article = store
            .create_from_field_map(Article::NAME, &map)
            .unwrap()
            .to_record()
            .unwrap();
        assert_eq!(article.pages, 120);
        assert!(article.published);

        let mut bad = map.clone();
        bad.insert("pages".into(), "many".into());
        assert!(matches!(
            store.create_from_field_map(Article::NAME, &bad),
            Err(AppError::Conversion { .. })
        ));
    }

    #[test]
    fn instance_serializes_as_object() {
        let store = store();
        let id = store.add(EMPLOYEES, &employee("Ann", "a@x.com")).unwrap();
        let inst = store.get_by_id(EMPLOYEES, id).unwrap().unwrap();
        assert_eq!(
            serde_json::to_value(&inst).unwrap(),
            serde_json::json!({"id": 1, "name": "Ann", "email": "a@x.com"})
        );
    }
}
