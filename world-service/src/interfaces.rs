//! Interfaces of the World service and their descriptors.
//!
//! `World` is the root interface. `humans()` and `continents()` return interfaces, so every call
//! below them travels as a chain: `GET /humans/find/1`, `POST /continents/move/europe`.
use crate::messages::{
    CONTINENT, CONTINENT_NAME, Continent, ContinentName, EVENT, HUMAN, Human, LOCATION, Location,
    WORLD_EXCEPTION,
};
use chainrpc_core::invocation::arg;
use chainrpc_core::{
    ArgRouting, DataType, Dispatched, InterfaceDescriptor, InvokeError, Message, MethodDescriptor,
};
use std::sync::{Arc, LazyLock};

pub trait World: Send + Sync {
    fn humans(&self) -> Result<Box<dyn Humans>, InvokeError>;

    fn continents(&self) -> Result<Box<dyn Continents>, InvokeError>;

    fn switch_day_night(&self) -> Result<(), InvokeError>;

    /// Latest events first. Elements are [`crate::BirthEvent`]s or [`crate::DeathEvent`]s.
    fn events(
        &self,
        limit: Option<i32>,
        offset: Option<i64>,
    ) -> Result<Option<Vec<Box<dyn Message>>>, InvokeError>;
}

pub trait Humans: Send + Sync {
    fn find(&self, id: Option<i64>) -> Result<Option<Human>, InvokeError>;

    fn all(&self, limit: Option<i32>, offset: Option<i32>)
    -> Result<Option<Vec<Human>>, InvokeError>;

    fn create(&self, human: Option<Human>) -> Result<Option<Human>, InvokeError>;
}

pub trait Continents: Send + Sync {
    fn all(&self) -> Result<Option<Vec<Continent>>, InvokeError>;

    fn r#move(&self, name: Option<ContinentName>, to: Option<Location>)
    -> Result<(), InvokeError>;
}

/// The receiver every `World` dispatcher expects.
pub type WorldReceiver = Arc<dyn World>;

pub type HumansReceiver = Box<dyn Humans>;

pub type ContinentsReceiver = Box<dyn Continents>;

// World

pub static WORLD_HUMANS: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("humans")
        .returns_interface(|| &*HUMANS)
        .dispatcher(|world: &WorldReceiver, _| Ok(Dispatched::interface(world.humans()?)))
        .build()
        .expect("valid method")
});

pub static WORLD_CONTINENTS: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("continents")
        .returns_interface(|| &*CONTINENTS)
        .dispatcher(|world: &WorldReceiver, _| Ok(Dispatched::interface(world.continents()?)))
        .build()
        .expect("valid method")
});

pub static WORLD_SWITCH_DAY_NIGHT: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("switchDayNight")
        .post()
        .returns(DataType::Void)
        .dispatcher(|world: &WorldReceiver, _| {
            world.switch_day_night()?;
            Ok(Dispatched::void())
        })
        .build()
        .expect("valid method")
});

pub static WORLD_EVENTS: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("events")
        .arg("limit", DataType::Int32, ArgRouting::Query)
        .arg("offset", DataType::Int64, ArgRouting::Query)
        .returns(DataType::list(DataType::Message(&EVENT)))
        .dispatcher(|world: &WorldReceiver, args| {
            Ok(Dispatched::data(world.events(arg(args, 0)?, arg(args, 1)?)?))
        })
        .build()
        .expect("valid method")
});

pub static WORLD: LazyLock<InterfaceDescriptor> = LazyLock::new(|| {
    InterfaceDescriptor::builder("World")
        .exception(&WORLD_EXCEPTION)
        .method(&WORLD_HUMANS)
        .method(&WORLD_CONTINENTS)
        .method(&WORLD_SWITCH_DAY_NIGHT)
        .method(&WORLD_EVENTS)
        .build()
        .expect("valid interface")
});

// Humans

pub static HUMANS_FIND: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("find")
        .arg("id", DataType::Int64, ArgRouting::Path)
        .returns(DataType::Message(&HUMAN))
        .dispatcher(|humans: &HumansReceiver, args| {
            Ok(Dispatched::data(humans.find(arg(args, 0)?)?))
        })
        .build()
        .expect("valid method")
});

pub static HUMANS_ALL: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("all")
        .arg("limit", DataType::Int32, ArgRouting::Query)
        .arg("offset", DataType::Int32, ArgRouting::Query)
        .returns(DataType::list(DataType::Message(&HUMAN)))
        .dispatcher(|humans: &HumansReceiver, args| {
            Ok(Dispatched::data(humans.all(arg(args, 0)?, arg(args, 1)?)?))
        })
        .build()
        .expect("valid method")
});

pub static HUMANS_CREATE: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("create")
        .arg("human", DataType::Message(&HUMAN), ArgRouting::Body)
        .post()
        .returns(DataType::Message(&HUMAN))
        .dispatcher(|humans: &HumansReceiver, args| {
            Ok(Dispatched::data(humans.create(arg(args, 0)?)?))
        })
        .build()
        .expect("valid method")
});

pub static HUMANS: LazyLock<InterfaceDescriptor> = LazyLock::new(|| {
    InterfaceDescriptor::builder("Humans")
        .exception(&WORLD_EXCEPTION)
        .method(&HUMANS_FIND)
        .method(&HUMANS_ALL)
        .method(&HUMANS_CREATE)
        .build()
        .expect("valid interface")
});

// Continents

pub static CONTINENTS_ALL: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("all")
        .returns(DataType::list(DataType::Message(&CONTINENT)))
        .dispatcher(|continents: &ContinentsReceiver, _| Ok(Dispatched::data(continents.all()?)))
        .build()
        .expect("valid method")
});

pub static CONTINENTS_MOVE: LazyLock<MethodDescriptor> = LazyLock::new(|| {
    MethodDescriptor::builder("move")
        .arg("name", DataType::Enum(&CONTINENT_NAME), ArgRouting::Path)
        .arg("to", DataType::Message(&LOCATION), ArgRouting::Body)
        .post()
        .returns(DataType::Void)
        .dispatcher(|continents: &ContinentsReceiver, args| {
            continents.r#move(arg(args, 0)?, arg(args, 1)?)?;
            Ok(Dispatched::void())
        })
        .build()
        .expect("valid method")
});

pub static CONTINENTS: LazyLock<InterfaceDescriptor> = LazyLock::new(|| {
    InterfaceDescriptor::builder("Continents")
        .exception(&WORLD_EXCEPTION)
        .method(&CONTINENTS_ALL)
        .method(&CONTINENTS_MOVE)
        .build()
        .expect("valid interface")
});

#[cfg(test)]
mod test {
    use super::*;
    use chainrpc_core::MethodResult;

    #[test]
    fn test_world_graph_verifies() {
        WORLD.verify().unwrap();
        assert_eq!(WORLD.exception(), Some(&*WORLD_EXCEPTION));
    }

    #[test]
    fn test_method_lookup() {
        assert_eq!(WORLD.method("humans"), Some(&*WORLD_HUMANS));
        assert_eq!(HUMANS.method("all"), Some(&*HUMANS_ALL));
        assert_eq!(CONTINENTS.method("all"), Some(&*CONTINENTS_ALL));
        assert!(WORLD.method("find").is_none());

        assert_eq!(
            WORLD_CONTINENTS.result(),
            &MethodResult::Interface(&*CONTINENTS)
        );
        assert!(CONTINENTS_MOVE.is_post());
        assert!(!HUMANS_FIND.is_post());
    }
}
