//! Environment-backed configuration.
//!
//! Variables are read once (after `.env` is loaded by [`dotenvy`]) and deserialized into [`Env`]
//! through a small serde deserializer. Field names map to `SCREAMING_SNAKE_CASE` variables,
//! sequences are comma separated and numbers are parsed from their string form.

use std::iter::empty;
use std::sync::LazyLock;

use serde::Deserialize;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, IntoDeserializer};
use thiserror::Error;
use tokio::sync::OnceCell;

static ENV_VARS: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);

/// Returns the process-wide configuration, loading it on first use.
pub async fn config() -> EnvResult<&'static Env> {
    ENV_VARS.get_or_try_init(|| async { Env::new() }).await
}

pub async fn get_var(var: Var) -> EnvResult<&'static str> {
    let vars = config().await?;
    Ok(match var {
        Var::DatabaseUrl => &vars.database_url,
        Var::ServerApiPort => &vars.server_api_port,
        Var::IdentitySharedSecret => &vars.identity_shared_secret,
        Var::CorsAllowOrigins => &vars.cors_allow_origins,
        Var::ApiServiceName => &vars.api_service_name,
        Var::ApiTracerName => &vars.api_tracer_name,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Env {
    pub database_url: String,
    pub server_api_port: String,
    pub identity_shared_secret: String,
    pub cors_allow_origins: String,
    pub api_service_name: String,
    pub api_tracer_name: String,
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        Ok(from_env::<Env>()?)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Var {
    DatabaseUrl,
    ServerApiPort,
    IdentitySharedSecret,
    CorsAllowOrigins,
    ApiServiceName,
    ApiTracerName,
}

#[macro_export]
macro_rules! var {
    ($ev:expr) => {
        $crate::util::env::get_var($ev)
    };
}

pub fn from_env<T>() -> Result<T, EnvDeserializeError>
where
    T: de::DeserializeOwned,
{
    from_iter(dotenvy::vars())
}

pub fn from_iter<Iter, T>(iter: Iter) -> Result<T, EnvDeserializeError>
where
    T: de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    let entries = iter.into_iter().map(|(name, value)| {
        let entry = Entry {
            name: name.clone(),
            value,
        };
        (name, entry)
    });

    T::deserialize(MapDeserializer::new(entries))
}

/// A single variable's value, remembering its name for error messages.
struct Entry {
    name: String,
    value: String,
}

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for Entry {
    type Deserializer = Self;
    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! parse_then_visit {
    ($($ty:ident => $method:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, EnvDeserializeError>
            where
                V: de::Visitor<'de>,
            {
                match self.value.trim().parse::<$ty>() {
                    Ok(parsed) => parsed.into_deserializer().$method(visitor),
                    Err(e) => Err(de::Error::custom(format_args!(
                        "{e}: while parsing '{}' from {}",
                        self.value, self.name
                    ))),
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Entry {
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.value.into_deserializer().deserialize_any(visitor)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        if self.value.trim().is_empty() {
            return SeqDeserializer::new(empty::<Entry>()).deserialize_seq(visitor);
        }

        let name = self.name;
        let items = self
            .value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Entry {
                name: name.clone(),
                value: item.to_owned(),
            })
            .collect::<Vec<_>>();

        SeqDeserializer::new(items.into_iter()).deserialize_seq(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        if self.value.trim().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(
        self,
        _: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _: &'static str,
        _: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self.value.into_deserializer())
    }

    parse_then_visit! {
        bool => deserialize_bool,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
    }

    serde::forward_to_deserialize_any! {
        i8 i16 u8 f32 f64 char str string unit bytes byte_buf map
        unit_struct tuple_struct identifier tuple ignored_any struct
    }
}

impl de::Error for EnvDeserializeError {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        EnvDeserializeError::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        EnvDeserializeError::MissingValue(field.into())
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    Dotenvy(#[from] dotenvy::Error),

    #[error(transparent)]
    DeserializationError(#[from] EnvDeserializeError),
}

#[derive(Debug, Error)]
pub enum EnvDeserializeError {
    #[error("env deserialization error: {0}")]
    Custom(String),

    #[error("missing environment variable {0}")]
    MissingValue(String),
}
