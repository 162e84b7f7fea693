//! Messages and enums of the World service.
use chainrpc_core::{DataType, EnumDescriptor, FieldAccessor, FieldDescriptor, MessageDescriptor};
use chrono::{DateTime, Utc};
use std::sync::LazyLock;

macro_rules! field {
    ($message:ty, $name:literal, $field:ident, $ty:expr) => {
        FieldDescriptor::new(
            $name,
            $ty,
            FieldAccessor::of(|m: &$message| &m.$field, |m: &mut $message| &mut m.$field),
        )
    };
}

// Enums

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
    Centaur,
}

pub static SEX: LazyLock<EnumDescriptor> = LazyLock::new(|| {
    EnumDescriptor::new("Sex", ["MALE", "FEMALE", "CENTAUR"]).expect("valid enum")
});

chainrpc_core::impl_enum!(Sex, SEX, [Male, Female, Centaur]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContinentName {
    Africa,
    Antarctica,
    Asia,
    Australia,
    Europe,
    NorthAmerica,
    SouthAmerica,
}

pub static CONTINENT_NAME: LazyLock<EnumDescriptor> = LazyLock::new(|| {
    EnumDescriptor::new(
        "ContinentName",
        [
            "AFRICA",
            "ANTARCTICA",
            "ASIA",
            "AUSTRALIA",
            "EUROPE",
            "NORTH_AMERICA",
            "SOUTH_AMERICA",
        ],
    )
    .expect("valid enum")
});

chainrpc_core::impl_enum!(
    ContinentName,
    CONTINENT_NAME,
    [
        Africa,
        Antarctica,
        Asia,
        Australia,
        Europe,
        NorthAmerica,
        SouthAmerica
    ]
);

impl ContinentName {
    pub const ALL: [ContinentName; 7] = [
        ContinentName::Africa,
        ContinentName::Antarctica,
        ContinentName::Asia,
        ContinentName::Australia,
        ContinentName::Europe,
        ContinentName::NorthAmerica,
        ContinentName::SouthAmerica,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Birth,
    Death,
}

pub static EVENT_TYPE: LazyLock<EnumDescriptor> = LazyLock::new(|| {
    EnumDescriptor::new("EventType", ["BIRTH", "DEATH"]).expect("valid enum")
});

chainrpc_core::impl_enum!(EventType, EVENT_TYPE, [Birth, Death]);

// Messages

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Human {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub sex: Option<Sex>,
    pub continent: Option<ContinentName>,
}

impl Human {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

pub static HUMAN: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Human")
        .factory(|| Box::new(Human::default()))
        .field(field!(Human, "id", id, DataType::Int64))
        .field(field!(Human, "name", name, DataType::String))
        .field(field!(Human, "birthday", birthday, DataType::Datetime))
        .field(field!(Human, "sex", sex, DataType::Enum(&SEX)))
        .field(field!(Human, "continent", continent, DataType::Enum(&CONTINENT_NAME)))
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(Human, HUMAN);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
        }
    }
}

pub static LOCATION: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Location")
        .factory(|| Box::new(Location::default()))
        .field(field!(Location, "lat", lat, DataType::Double))
        .field(field!(Location, "lng", lng, DataType::Double))
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(Location, LOCATION);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Continent {
    pub name: Option<ContinentName>,
    pub location: Option<Location>,
    /// Number of humans living there.
    pub humans: Option<i64>,
}

pub static CONTINENT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Continent")
        .factory(|| Box::new(Continent::default()))
        .field(field!(Continent, "name", name, DataType::Enum(&CONTINENT_NAME)))
        .field(field!(Continent, "location", location, DataType::Message(&LOCATION)))
        .field(field!(Continent, "humans", humans, DataType::Int64))
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(Continent, CONTINENT);

/// The base of every world event. Its `type` field selects the concrete event on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    pub id: Option<i64>,
    pub type_: Option<EventType>,
    pub time: Option<DateTime<Utc>>,
}

pub static EVENT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("Event")
        .factory(|| Box::new(Event::default()))
        .field(field!(Event, "id", id, DataType::Int64))
        .field(field!(Event, "type", type_, DataType::Enum(&EVENT_TYPE)).discriminator())
        .field(field!(Event, "time", time, DataType::Datetime))
        .subtype(|| &*BIRTH_EVENT)
        .subtype(|| &*DEATH_EVENT)
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(Event, EVENT);

#[derive(Debug, Clone, PartialEq)]
pub struct BirthEvent {
    pub event: Event,
    pub human: Option<Human>,
}

impl Default for BirthEvent {
    fn default() -> Self {
        Self {
            event: Event {
                type_: Some(EventType::Birth),
                ..Event::default()
            },
            human: None,
        }
    }
}

pub static BIRTH_EVENT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("BirthEvent")
        .factory(|| Box::new(BirthEvent::default()))
        .base(&EVENT)
        .discriminator_value(EventType::Birth)
        .field(field!(BirthEvent, "human", human, DataType::Message(&HUMAN)))
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(BirthEvent, BIRTH_EVENT, base = event);

#[derive(Debug, Clone, PartialEq)]
pub struct DeathEvent {
    pub event: Event,
    pub human_id: Option<i64>,
}

impl Default for DeathEvent {
    fn default() -> Self {
        Self {
            event: Event {
                type_: Some(EventType::Death),
                ..Event::default()
            },
            human_id: None,
        }
    }
}

pub static DEATH_EVENT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("DeathEvent")
        .factory(|| Box::new(DeathEvent::default()))
        .base(&EVENT)
        .discriminator_value(EventType::Death)
        .field(field!(DeathEvent, "humanId", human_id, DataType::Int64))
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(DeathEvent, DEATH_EVENT, base = event);

/// The declared exception of every World interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldException {
    pub text: Option<String>,
}

impl WorldException {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

pub static WORLD_EXCEPTION: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::builder("WorldException")
        .factory(|| Box::new(WorldException::default()))
        .field(field!(WorldException, "text", text, DataType::String))
        .build()
        .expect("valid message")
});

chainrpc_core::impl_message!(WorldException, WORLD_EXCEPTION);
