use log::{debug, info, warn};
use thiserror::Error;

use crate::logic::ordering::{self, Ordered};
use crate::model::{
    generate_id, NewProperty, Property, PropertyFeature, PropertyFilter, PropertyImage,
    PropertyPatch, StatusCounts,
};
use crate::seed::{default_properties, STORAGE_KEY};
use crate::store::{KeyValueStorage, StorageError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("property store used before load()")]
    NotLoaded,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
enum StoreState {
    Uninitialized,
    Ready(Vec<Property>),
}

/// Owner of the property catalog and every nested image and feature list.
///
/// Each mutation runs against a working copy, is written to storage as one
/// full snapshot, and only then becomes the in-memory state. Lookups by an
/// unknown id return `false` / `None` and touch nothing.
#[derive(Debug)]
pub struct PropertyStore<S> {
    storage: S,
    key: String,
    state: StoreState,
}

impl<S: KeyValueStorage> PropertyStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            state: StoreState::Uninitialized,
        }
    }

    /// Create and load in one step
    pub fn open(storage: S) -> StoreResult<Self> {
        let mut store = Self::new(storage);
        store.load()?;
        Ok(store)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, StoreState::Ready(_))
    }

    /// Read the snapshot from storage into memory, seeding the default
    /// catalog when the slot is empty or unreadable.
    pub fn load(&mut self) -> StoreResult<Vec<Property>> {
        let properties = match self.storage.get(&self.key)? {
            None => {
                info!("No snapshot under '{}', seeding default catalog", self.key);
                self.seed()?
            }
            Some(raw) => match parse_snapshot(&raw) {
                Ok(properties) => properties,
                Err(reason) => {
                    warn!(
                        "Discarding malformed snapshot under '{}': {}; reseeding",
                        self.key, reason
                    );
                    self.seed()?
                }
            },
        };

        info!("Loaded {} properties", properties.len());
        self.state = StoreState::Ready(properties.clone());
        Ok(properties)
    }

    fn seed(&self) -> StoreResult<Vec<Property>> {
        let properties = default_properties();
        self.persist(&properties)?;
        Ok(properties)
    }

    fn persist(&self, properties: &[Property]) -> StoreResult<()> {
        debug_assert!(ordering::is_dense(properties));
        debug_assert!(properties
            .iter()
            .all(|p| ordering::is_dense(&p.images) && ordering::is_dense(&p.features)));

        let json = serde_json::to_string(properties)?;
        self.storage.set(&self.key, &json)?;
        Ok(())
    }

    fn ready(&self) -> StoreResult<&Vec<Property>> {
        match &self.state {
            StoreState::Ready(properties) => Ok(properties),
            StoreState::Uninitialized => Err(StoreError::NotLoaded),
        }
    }

    /// Apply `change` to a copy of the catalog. `None` from the closure means
    /// nothing to do: no write, state unchanged. State is replaced only after
    /// the snapshot is stored.
    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Vec<Property>) -> StoreResult<Option<T>>,
    ) -> StoreResult<Option<T>> {
        let mut working = self.ready()?.clone();
        let Some(outcome) = change(&mut working)? else {
            return Ok(None);
        };
        self.commit(working)?;
        Ok(Some(outcome))
    }

    fn commit(&mut self, working: Vec<Property>) -> StoreResult<()> {
        self.persist(&working)?;
        self.state = StoreState::Ready(working);
        Ok(())
    }

    /// Shared path for every single-property mutation, nested ones included
    fn update_with<T>(
        &mut self,
        id: &str,
        change: impl FnOnce(&mut Property) -> StoreResult<Option<T>>,
    ) -> StoreResult<Option<T>> {
        self.mutate(|properties| match properties.iter_mut().find(|p| p.id == id) {
            Some(property) => change(property),
            None => Ok(None),
        })
    }

    /// Properties in display order
    pub fn properties(&self) -> StoreResult<Vec<Property>> {
        Ok(self.ready()?.clone())
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.ready()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.ready()?.is_empty())
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<Property>> {
        Ok(self.ready()?.iter().find(|p| p.id == id).cloned())
    }

    pub fn filtered(&self, filter: &PropertyFilter) -> StoreResult<Vec<Property>> {
        Ok(filter.apply(self.ready()?))
    }

    pub fn status_counts(&self) -> StoreResult<StatusCounts> {
        Ok(StatusCounts::from_properties(self.ready()?))
    }

    pub fn add_property(&mut self, data: NewProperty) -> StoreResult<Property> {
        let mut working = self.ready()?.clone();
        let property = data.into_property(generate_id(), working.len());
        working.push(property.clone());
        self.commit(working)?;
        debug!("Added property {} at position {}", property.id, property.order);
        Ok(property)
    }

    /// Returns `false` if no property has `id`
    pub fn update_property(&mut self, id: &str, patch: &PropertyPatch) -> StoreResult<bool> {
        let updated = self
            .update_with(id, |property| {
                patch.apply_to(property);
                Ok(Some(()))
            })?
            .is_some();
        if updated {
            debug!("Updated property {}", id);
        }
        Ok(updated)
    }

    pub fn delete_property(&mut self, id: &str) -> StoreResult<bool> {
        let deleted = self
            .mutate(|properties| Ok(ordering::remove_item(properties, id)))?
            .is_some();
        if deleted {
            debug!("Deleted property {}", id);
        }
        Ok(deleted)
    }

    /// Move `active_id` to where `over_id` sits and renumber the catalog
    pub fn reorder_properties(&mut self, active_id: &str, over_id: &str) -> StoreResult<bool> {
        let moved = self
            .mutate(|properties| {
                Ok(ordering::move_item(properties, active_id, over_id).then_some(()))
            })?
            .is_some();
        if moved {
            debug!("Moved property {} over {}", active_id, over_id);
        }
        Ok(moved)
    }

    /// Append an image; the first image of a property becomes its thumbnail.
    /// Returns `None` if the property does not exist.
    pub fn add_image(&mut self, property_id: &str, url: &str) -> StoreResult<Option<PropertyImage>> {
        let url = non_blank(url, "image url")?;
        self.update_with(property_id, |property| {
            let image = PropertyImage::new(url, property.images.len());
            property.images.push(image.clone());
            Ok(Some(image))
        })
    }

    pub fn remove_image(&mut self, property_id: &str, image_id: &str) -> StoreResult<bool> {
        let removed = self.update_with(property_id, |property| {
            Ok(ordering::remove_item(&mut property.images, image_id))
        })?;
        Ok(removed.is_some())
    }

    pub fn reorder_images(
        &mut self,
        property_id: &str,
        active_id: &str,
        over_id: &str,
    ) -> StoreResult<bool> {
        self.reorder_nested(property_id, |property| &mut property.images, active_id, over_id)
    }

    pub fn add_feature(
        &mut self,
        property_id: &str,
        name: &str,
    ) -> StoreResult<Option<PropertyFeature>> {
        let name = non_blank(name, "feature name")?;
        self.update_with(property_id, |property| {
            let feature = PropertyFeature::new(name, property.features.len());
            property.features.push(feature.clone());
            Ok(Some(feature))
        })
    }

    pub fn remove_feature(&mut self, property_id: &str, feature_id: &str) -> StoreResult<bool> {
        let removed = self.update_with(property_id, |property| {
            Ok(ordering::remove_item(&mut property.features, feature_id))
        })?;
        Ok(removed.is_some())
    }

    pub fn reorder_features(
        &mut self,
        property_id: &str,
        active_id: &str,
        over_id: &str,
    ) -> StoreResult<bool> {
        self.reorder_nested(property_id, |property| &mut property.features, active_id, over_id)
    }

    fn reorder_nested<T: Ordered>(
        &mut self,
        property_id: &str,
        nested: impl FnOnce(&mut Property) -> &mut Vec<T>,
        active_id: &str,
        over_id: &str,
    ) -> StoreResult<bool> {
        let moved = self.update_with(property_id, |property| {
            Ok(ordering::move_item(nested(property), active_id, over_id).then_some(()))
        })?;
        Ok(moved.is_some())
    }
}

fn non_blank(value: &str, what: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(format!("{} must not be blank", what)));
    }
    Ok(trimmed.to_string())
}

/// Parse a stored snapshot. Orders and nested ids are repaired; duplicate
/// property ids make the snapshot unusable.
fn parse_snapshot(raw: &str) -> Result<Vec<Property>, String> {
    let mut properties: Vec<Property> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    if !ordering::has_unique_ids(&properties) {
        return Err("duplicate property ids".to_string());
    }

    let mut repaired = ordering::normalize(&mut properties);
    for property in properties.iter_mut() {
        repaired |= property.normalize_nested();
    }
    if repaired {
        warn!("Snapshot had gaps or duplicates in order fields; renumbered in memory");
    }

    for property in properties.iter_mut() {
        if property.repair_nested_ids() {
            warn!(
                "Property {} had blank or repeated image/feature ids; reassigned in memory",
                property.id
            );
        }
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyStatus, PropertyType};
    use crate::store::MemoryStorage;

    fn ids(properties: &[Property]) -> Vec<String> {
        properties.iter().map(|p| p.id.clone()).collect()
    }

    fn orders<T: Ordered>(items: &[T]) -> Vec<usize> {
        items.iter().map(Ordered::order).collect()
    }

    fn new_property(name: &str) -> NewProperty {
        NewProperty {
            name: name.to_string(),
            location: "Oakland, CA".to_string(),
            price: 500_000,
            beds: 2,
            baths: 1,
            sqft: 900,
            images: vec![],
            features: vec![],
            status: PropertyStatus::Available,
            kind: PropertyType::Condo,
            agent: "Michael Chen".to_string(),
            listed: "2024-03-01".to_string(),
        }
    }

    /// Store holding exactly A, B, C, D in that order
    fn abcd_store() -> (PropertyStore<MemoryStorage>, Vec<String>) {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "[]").unwrap();
        let mut store = PropertyStore::open(storage).unwrap();
        let ids = ["A", "B", "C", "D"]
            .iter()
            .map(|name| store.add_property(new_property(name)).unwrap().id)
            .collect();
        (store, ids)
    }

    fn names(store: &PropertyStore<MemoryStorage>) -> Vec<String> {
        store.properties().unwrap().into_iter().map(|p| p.name).collect()
    }

    fn stored(store: &PropertyStore<MemoryStorage>) -> Option<String> {
        store.storage().get(STORAGE_KEY).unwrap()
    }

    #[test]
    fn test_operations_before_load_fail() {
        let mut store = PropertyStore::new(MemoryStorage::new());
        assert!(!store.is_loaded());
        assert!(matches!(store.properties(), Err(StoreError::NotLoaded)));
        assert!(matches!(
            store.add_property(new_property("X")),
            Err(StoreError::NotLoaded)
        ));
        assert!(matches!(store.delete_property("1"), Err(StoreError::NotLoaded)));
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_load_seeds_empty_storage() {
        let storage = MemoryStorage::new();
        let mut store = PropertyStore::new(storage.clone());

        let loaded = store.load().unwrap();
        assert!(store.is_loaded());
        assert_eq!(loaded, default_properties());

        let mut reopened = PropertyStore::new(storage);
        assert_eq!(reopened.load().unwrap(), loaded);
    }

    #[test]
    fn test_load_keeps_existing_snapshot() {
        let storage = MemoryStorage::new();
        let mut first = PropertyStore::open(storage.clone()).unwrap();
        first.delete_property("3").unwrap();

        let second = PropertyStore::open(storage).unwrap();
        assert_eq!(second.len().unwrap(), 5);
        assert!(second.get("3").unwrap().is_none());
    }

    #[test]
    fn test_malformed_snapshot_falls_back_to_seed() {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();

        let store = PropertyStore::open(storage.clone()).unwrap();
        assert_eq!(store.properties().unwrap(), default_properties());

        let persisted: Vec<Property> =
            serde_json::from_str(&storage.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, default_properties());
    }

    #[test]
    fn test_duplicate_ids_in_snapshot_fall_back_to_seed() {
        let mut catalog = default_properties();
        catalog[1].id = catalog[0].id.clone();
        let storage = MemoryStorage::new();
        storage
            .set(STORAGE_KEY, &serde_json::to_string(&catalog).unwrap())
            .unwrap();

        let store = PropertyStore::open(storage).unwrap();
        assert_eq!(store.properties().unwrap(), default_properties());
    }

    #[test]
    fn test_repeated_nested_ids_are_reassigned_on_load() {
        let mut catalog = default_properties();
        let extra = PropertyImage {
            id: "img1".to_string(),
            url: "https://example.com/back.jpg".to_string(),
            order: 1,
        };
        catalog[0].images.push(extra);
        let storage = MemoryStorage::new();
        storage
            .set(STORAGE_KEY, &serde_json::to_string(&catalog).unwrap())
            .unwrap();

        let mut store = PropertyStore::open(storage).unwrap();
        let images = store.get("1").unwrap().unwrap().images;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, "img1");
        assert!(ordering::has_unique_ids(&images));

        assert!(store.remove_image("1", "img1").unwrap());
        let images = store.get("1").unwrap().unwrap().images;
        assert_eq!(images.len(), 1);
        assert_ne!(images[0].id, "img1");
        assert_eq!(images[0].url, "https://example.com/back.jpg");
        assert_eq!(images[0].order, 0);
    }

    #[test]
    fn test_gapped_orders_are_repaired_on_load() {
        let mut catalog = default_properties();
        catalog.reverse();
        for (i, property) in catalog.iter_mut().enumerate() {
            property.order = 100 - i * 10;
        }
        catalog[0].features.iter_mut().for_each(|f| f.order += 5);

        let storage = MemoryStorage::new();
        storage
            .set(STORAGE_KEY, &serde_json::to_string(&catalog).unwrap())
            .unwrap();

        let store = PropertyStore::open(storage).unwrap();
        let loaded = store.properties().unwrap();
        assert_eq!(ids(&loaded), vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(orders(&loaded), vec![0, 1, 2, 3, 4, 5]);
        assert!(loaded.iter().all(|p| ordering::is_dense(&p.features)));
    }

    #[test]
    fn test_add_property_appends_with_next_order() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();
        let created = store.add_property(new_property("Bay Condo")).unwrap();

        assert_eq!(created.order, 6);
        assert!(!created.id.is_empty());
        assert_eq!(store.len().unwrap(), 7);
        assert_eq!(store.properties().unwrap().last(), Some(&created));
        assert!(stored(&store).unwrap().contains(&created.id));
    }

    #[test]
    fn test_added_ids_are_unique() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();
        for i in 0..20 {
            store.add_property(new_property(&format!("P{}", i))).unwrap();
        }
        assert!(ordering::has_unique_ids(&store.properties().unwrap()));
    }

    #[test]
    fn test_update_property_merges_patch() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();
        let patch = PropertyPatch {
            price: Some(2_000_000),
            status: Some(PropertyStatus::Sold),
            ..Default::default()
        };

        assert!(store.update_property("2", &patch).unwrap());

        let updated = store.get("2").unwrap().unwrap();
        assert_eq!(updated.price, 2_000_000);
        assert_eq!(updated.status, PropertyStatus::Sold);
        assert_eq!(updated.name, "Modern Ocean View");
        assert_eq!(updated.order, 1);
        assert_eq!(store.get("1").unwrap().unwrap(), default_properties()[0]);
    }

    #[test]
    fn test_unknown_ids_leave_snapshot_untouched() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();
        let before = stored(&store);
        let patch = PropertyPatch {
            name: Some("Nope".to_string()),
            ..Default::default()
        };

        assert!(!store.update_property("missing", &patch).unwrap());
        assert!(!store.delete_property("missing").unwrap());
        assert!(!store.reorder_properties("missing", "1").unwrap());
        assert!(!store.reorder_properties("1", "missing").unwrap());
        assert!(store.add_image("missing", "https://x").unwrap().is_none());
        assert!(!store.remove_image("1", "missing").unwrap());
        assert!(!store.remove_feature("missing", "f1").unwrap());
        assert!(!store.reorder_features("1", "f1", "missing").unwrap());

        assert_eq!(stored(&store), before);
        assert_eq!(store.properties().unwrap(), default_properties());
    }

    #[test]
    fn test_delete_renumbers_survivors() {
        let (mut store, ids) = abcd_store();
        assert!(store.delete_property(&ids[1]).unwrap());

        let remaining = store.properties().unwrap();
        assert_eq!(names(&store), vec!["A", "C", "D"]);
        assert_eq!(orders(&remaining), vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_forward_golden() {
        let (mut store, ids) = abcd_store();
        assert!(store.reorder_properties(&ids[0], &ids[2]).unwrap());

        assert_eq!(names(&store), vec!["B", "A", "C", "D"]);
        assert_eq!(orders(&store.properties().unwrap()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reorder_backward_golden() {
        let (mut store, ids) = abcd_store();
        assert!(store.reorder_properties(&ids[3], &ids[1]).unwrap());
        assert_eq!(names(&store), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn test_reorder_onto_itself_is_noop() {
        let (mut store, ids) = abcd_store();
        let before = stored(&store);
        assert!(!store.reorder_properties(&ids[2], &ids[2]).unwrap());
        assert_eq!(names(&store), vec!["A", "B", "C", "D"]);
        assert_eq!(stored(&store), before);
    }

    #[test]
    fn test_image_lifecycle_tracks_main_image() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();

        let second = store.add_image("1", "  https://example.com/b.jpg ").unwrap().unwrap();
        let third = store.add_image("1", "https://example.com/c.jpg").unwrap().unwrap();
        assert_eq!(second.url, "https://example.com/b.jpg");
        assert_eq!((second.order, third.order), (1, 2));

        let main = |store: &PropertyStore<MemoryStorage>| {
            store.get("1").unwrap().unwrap().main_image().map(|i| i.id.clone())
        };
        assert_eq!(main(&store).as_deref(), Some("img1"));

        assert!(store.reorder_images("1", &third.id, "img1").unwrap());
        assert_eq!(main(&store), Some(third.id.clone()));

        assert!(store.remove_image("1", &third.id).unwrap());
        let property = store.get("1").unwrap().unwrap();
        assert_eq!(orders(&property.images), vec![0, 1]);
        assert_eq!(main(&store).as_deref(), Some("img1"));
    }

    #[test]
    fn test_blank_nested_input_is_rejected() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();
        assert!(matches!(
            store.add_image("1", "   "),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.add_feature("1", ""),
            Err(StoreError::InvalidInput(_))
        ));
        assert_eq!(store.properties().unwrap(), default_properties());
    }

    #[test]
    fn test_feature_add_remove_reorder() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();

        let wine = store.add_feature("4", "Wine Cellar").unwrap().unwrap();
        assert_eq!(wine.order, 2);

        assert!(store.reorder_features("4", &wine.id, "f6").unwrap());
        let features: Vec<_> = store
            .get("4")
            .unwrap()
            .unwrap()
            .features
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(features, vec!["Wine Cellar", "Garden", "Guest House"]);

        assert!(store.remove_feature("4", "f6").unwrap());
        let property = store.get("4").unwrap().unwrap();
        assert_eq!(orders(&property.features), vec![0, 1]);
        assert_eq!(property.features[1].id, "f7");

        // Other properties are untouched
        assert_eq!(store.get("1").unwrap().unwrap(), default_properties()[0]);
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let storage = MemoryStorage::with_limit(4096);
        let mut store = PropertyStore::open(storage).unwrap();
        let before = store.properties().unwrap();

        let huge = "x".repeat(8192);
        let err = store.add_feature("1", &huge).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Storage(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(store.properties().unwrap(), before);
    }

    #[test]
    fn test_filter_and_counts_follow_mutations() {
        let mut store = PropertyStore::open(MemoryStorage::new()).unwrap();
        let patch = PropertyPatch {
            status: Some(PropertyStatus::Sold),
            ..Default::default()
        };
        store.update_property("1", &patch).unwrap();

        let counts = store.status_counts().unwrap();
        assert_eq!((counts.available, counts.sold, counts.total), (2, 2, 6));

        let filter = PropertyFilter {
            status: Some(PropertyStatus::Sold),
            ..Default::default()
        };
        assert_eq!(ids(&store.filtered(&filter).unwrap()), vec!["1", "4"]);
    }
}
