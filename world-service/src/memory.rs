//! An in-memory World.
//!
//! Every returned message is a copy, so callers never observe later changes to the store.
use crate::interfaces::{Continents, Humans, World};
use crate::messages::{
    BirthEvent, Continent, ContinentName, Event, EventType, Human, Location, WorldException,
};
use chainrpc_core::{InvokeError, Message};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    humans: Vec<Human>,
    continents: Vec<Continent>,
    events: Vec<Box<dyn Message>>,
}

impl Store {
    fn with_continents() -> Self {
        let continents = ContinentName::ALL
            .into_iter()
            .map(|name| Continent {
                name: Some(name),
                location: Some(default_location(name)),
                humans: Some(0),
            })
            .collect();

        Self {
            continents,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

fn default_location(name: ContinentName) -> Location {
    match name {
        ContinentName::Africa => Location::new(8.78, 34.51),
        ContinentName::Antarctica => Location::new(-82.86, 135.0),
        ContinentName::Asia => Location::new(34.05, 100.62),
        ContinentName::Australia => Location::new(-25.27, 133.78),
        ContinentName::Europe => Location::new(54.53, 15.26),
        ContinentName::NorthAmerica => Location::new(54.53, -105.26),
        ContinentName::SouthAmerica => Location::new(-8.78, -55.49),
    }
}

type Shared = Arc<Mutex<Store>>;

fn lock(store: &Shared) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns `items[offset..offset + limit]`, clamped to the available items.
///
/// A missing limit returns everything after `offset`; negative bounds return nothing.
fn page<T: Clone>(items: &[T], limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    let offset = offset.unwrap_or(0);
    let limit = limit.unwrap_or(i64::MAX);
    if offset < 0 || limit < 0 {
        return Vec::new();
    }

    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(items.len());
    let end = start.saturating_add(usize::try_from(limit).unwrap_or(usize::MAX));
    items[start..end.min(items.len())].to_vec()
}

/// A World kept in process memory. Clones share the same store.
#[derive(Debug, Clone)]
pub struct InMemoryWorld {
    store: Shared,
    day: Arc<AtomicBool>,
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryWorld {
    /// A world with every continent and no humans.
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::with_continents())),
            day: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_day(&self) -> bool {
        self.day.load(Ordering::SeqCst)
    }
}

impl World for InMemoryWorld {
    fn humans(&self) -> Result<Box<dyn Humans>, InvokeError> {
        Ok(Box::new(InMemoryHumans {
            store: self.store.clone(),
        }))
    }

    fn continents(&self) -> Result<Box<dyn Continents>, InvokeError> {
        Ok(Box::new(InMemoryContinents {
            store: self.store.clone(),
        }))
    }

    fn switch_day_night(&self) -> Result<(), InvokeError> {
        let was_day = self.day.fetch_xor(true, Ordering::SeqCst);
        tracing::debug!(day = !was_day, "Switched day and night");
        Ok(())
    }

    fn events(
        &self,
        limit: Option<i32>,
        offset: Option<i64>,
    ) -> Result<Option<Vec<Box<dyn Message>>>, InvokeError> {
        let store = lock(&self.store);
        let latest_first: Vec<Box<dyn Message>> = store.events.iter().rev().cloned().collect();
        Ok(Some(page(&latest_first, limit.map(i64::from), offset)))
    }
}

struct InMemoryHumans {
    store: Shared,
}

impl Humans for InMemoryHumans {
    fn find(&self, id: Option<i64>) -> Result<Option<Human>, InvokeError> {
        let store = lock(&self.store);
        Ok(store
            .humans
            .iter()
            .find(|human| id.is_some() && human.id == id)
            .cloned())
    }

    fn all(
        &self,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Option<Vec<Human>>, InvokeError> {
        let store = lock(&self.store);
        Ok(Some(page(
            &store.humans,
            limit.map(i64::from),
            offset.map(i64::from),
        )))
    }

    fn create(&self, human: Option<Human>) -> Result<Option<Human>, InvokeError> {
        let Some(mut human) = human else {
            return Ok(None);
        };
        if human.name.as_deref().is_none_or(str::is_empty) {
            return Err(InvokeError::application(WorldException::new(
                "Human name is required",
            )));
        }

        let mut store = lock(&self.store);
        human.id = Some(store.next_id());
        store.humans.push(human.clone());

        if let Some(name) = human.continent
            && let Some(continent) = store.continents.iter_mut().find(|c| c.name == Some(name))
        {
            continent.humans = Some(continent.humans.unwrap_or(0) + 1);
        }

        let event_id = store.next_id();
        store.events.push(Box::new(BirthEvent {
            event: Event {
                id: Some(event_id),
                type_: Some(EventType::Birth),
                time: Some(Utc::now()),
            },
            human: Some(human.clone()),
        }));

        tracing::debug!(id = human.id, name = human.name.as_deref(), "Created human");
        Ok(Some(human))
    }
}

struct InMemoryContinents {
    store: Shared,
}

impl Continents for InMemoryContinents {
    fn all(&self) -> Result<Option<Vec<Continent>>, InvokeError> {
        Ok(Some(lock(&self.store).continents.clone()))
    }

    fn r#move(&self, name: Option<ContinentName>, to: Option<Location>) -> Result<(), InvokeError> {
        let (Some(name), Some(to)) = (name, to) else {
            return Err(InvokeError::application(WorldException::new(
                "Continent name and location are required",
            )));
        };

        let mut store = lock(&self.store);
        if let Some(continent) = store.continents.iter_mut().find(|c| c.name == Some(name)) {
            continent.location = Some(to);
        }
        Ok(())
    }
}
