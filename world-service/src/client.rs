//! Client adapters: each interface implemented over an [`InvocationProxy`].
//!
//! Continuation methods return another adapter immediately. Nothing is sent until a terminal
//! method is called.
use crate::interfaces::{
    CONTINENTS_ALL, CONTINENTS_MOVE, Continents, HUMANS_ALL, HUMANS_CREATE, HUMANS_FIND, Humans,
    WORLD_CONTINENTS, WORLD_EVENTS, WORLD_HUMANS, WORLD_SWITCH_DAY_NIGHT, World,
};
use crate::messages::{Continent, ContinentName, Human, Location};
use chainrpc_core::{InvocationProxy, InvokeError, Message, Value};

#[derive(Debug, Clone)]
pub struct WorldClient(pub InvocationProxy);

#[derive(Debug, Clone)]
pub struct HumansClient(pub InvocationProxy);

#[derive(Debug, Clone)]
pub struct ContinentsClient(pub InvocationProxy);

impl World for WorldClient {
    fn humans(&self) -> Result<Box<dyn Humans>, InvokeError> {
        let proxy = self.0.chain(&WORLD_HUMANS, &[])?;
        Ok(Box::new(HumansClient(proxy)))
    }

    fn continents(&self) -> Result<Box<dyn Continents>, InvokeError> {
        let proxy = self.0.chain(&WORLD_CONTINENTS, &[])?;
        Ok(Box::new(ContinentsClient(proxy)))
    }

    fn switch_day_night(&self) -> Result<(), InvokeError> {
        self.0.call(&WORLD_SWITCH_DAY_NIGHT, &[]).map(drop)
    }

    fn events(
        &self,
        limit: Option<i32>,
        offset: Option<i64>,
    ) -> Result<Option<Vec<Box<dyn Message>>>, InvokeError> {
        self.0.call_as(
            &WORLD_EVENTS,
            &[limit.map(Value::from), offset.map(Value::from)],
        )
    }
}

impl Humans for HumansClient {
    fn find(&self, id: Option<i64>) -> Result<Option<Human>, InvokeError> {
        self.0.call_as(&HUMANS_FIND, &[id.map(Value::from)])
    }

    fn all(
        &self,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> Result<Option<Vec<Human>>, InvokeError> {
        self.0.call_as(
            &HUMANS_ALL,
            &[limit.map(Value::from), offset.map(Value::from)],
        )
    }

    fn create(&self, human: Option<Human>) -> Result<Option<Human>, InvokeError> {
        self.0.call_as(&HUMANS_CREATE, &[human.map(Value::from)])
    }
}

impl Continents for ContinentsClient {
    fn all(&self) -> Result<Option<Vec<Continent>>, InvokeError> {
        self.0.call_as(&CONTINENTS_ALL, &[])
    }

    fn r#move(&self, name: Option<ContinentName>, to: Option<Location>) -> Result<(), InvokeError> {
        self.0
            .call(&CONTINENTS_MOVE, &[name.map(Value::from), to.map(Value::from)])
            .map(drop)
    }
}
