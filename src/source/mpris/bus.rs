//! Session-bus access to MPRIS players.
//!
//! [`PlayerBus`] is the seam between the source logic (target resolution,
//! snapshot population) and D-Bus itself, so the former can be exercised
//! without a session bus.

use std::collections::HashMap;
use std::time::Duration;

use async_io::block_on;
use tracing::{debug, warn};
use zbus::fdo::{DBusProxy, PropertiesProxy};
use zbus::names::{BusName, InterfaceName};
use zbus::Connection;
use zvariant::{OwnedValue, Value};

use crate::error::SourceError;
use crate::song::PlayState;

pub const BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYER_IFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Track metadata as exposed by `org.mpris.MediaPlayer2.Player.Metadata`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub art_url: Option<String>,
    pub release: Option<String>,
    pub length_us: Option<i64>,
    /// Raw track number; some players send `"3/12"` strings.
    pub track_number: Option<String>,
    pub disc_number: Option<String>,
}

impl TrackMetadata {
    pub fn from_map(map: &HashMap<String, OwnedValue>) -> Self {
        let text = |key: &str| map.get(key).and_then(|v| value_str(v)).filter(|s| !s.is_empty());
        let number = |key: &str| map.get(key).and_then(|v| value_i64(v));
        let ordinal = |key: &str| {
            map.get(key)
                .and_then(|v| value_i64(v).map(|n| n.to_string()).or_else(|| value_str(v)))
        };

        Self {
            title: text("xesam:title"),
            artists: map
                .get("xesam:artist")
                .map(|v| value_strings(v))
                .unwrap_or_default(),
            album: text("xesam:album"),
            art_url: text("mpris:artUrl"),
            release: text("xesam:contentCreated"),
            length_us: number("mpris:length"),
            track_number: ordinal("xesam:trackNumber"),
            disc_number: ordinal("xesam:discNumber"),
        }
    }
}

/// Access to the players on a bus. One player at a time may be bound.
pub trait PlayerBus: Send {
    /// Whether a bus connection exists at all.
    fn connected(&self) -> bool;

    /// Full bus names of every MPRIS player currently registered.
    fn player_names(&mut self) -> Result<Vec<String>, SourceError>;

    fn bind(&mut self, bus_name: &str) -> Result<(), SourceError>;

    fn release(&mut self);

    fn status(&mut self) -> Result<PlayState, SourceError>;

    fn position_us(&mut self) -> Result<i64, SourceError>;

    fn metadata(&mut self) -> Result<TrackMetadata, SourceError>;

    /// Call a no-argument method on the player interface (`Next`, `Stop`...).
    fn call(&mut self, method: &str) -> Result<(), SourceError>;

    fn volume(&mut self) -> Result<f64, SourceError>;

    fn set_volume(&mut self, volume: f64) -> Result<(), SourceError>;
}

/// Map an MPRIS `PlaybackStatus` string.
pub fn play_state_from_status(status: &str) -> PlayState {
    match status {
        "Playing" => PlayState::Playing,
        "Paused" => PlayState::Paused,
        "Stopped" => PlayState::Stopped,
        _ => PlayState::Unknown,
    }
}

/// [`PlayerBus`] over the D-Bus session bus.
///
/// Calls are driven with `async_io::block_on`; every method call is bounded
/// by the connection's method timeout so a hung player cannot stall the
/// query thread forever.
pub struct DbusBus {
    conn: Option<Connection>,
    bound: Option<Bound>,
}

struct Bound {
    name: String,
    props: PropertiesProxy<'static>,
}

impl DbusBus {
    pub fn connect(call_timeout: Duration) -> Self {
        let conn = block_on(async {
            zbus::connection::Builder::session()?
                .method_timeout(call_timeout)
                .build()
                .await
        });

        match conn {
            Ok(conn) => Self {
                conn: Some(conn),
                bound: None,
            },
            Err(e) => {
                warn!("MPRIS: failed to connect to session bus: {e}");
                Self::disconnected()
            }
        }
    }

    pub fn disconnected() -> Self {
        Self {
            conn: None,
            bound: None,
        }
    }

    fn bound(&self) -> Result<&Bound, SourceError> {
        self.bound.as_ref().ok_or(SourceError::Unbound)
    }

    fn get(&self, property: &str) -> Result<OwnedValue, SourceError> {
        let bound = self.bound()?;
        block_on(
            bound
                .props
                .get(InterfaceName::from_static_str_unchecked(PLAYER_IFACE), property),
        )
        .map_err(|e| property_error(e, &bound.name))
    }
}

impl PlayerBus for DbusBus {
    fn connected(&self) -> bool {
        self.conn.is_some()
    }

    fn player_names(&mut self) -> Result<Vec<String>, SourceError> {
        let conn = self.conn.as_ref().ok_or(SourceError::Unbound)?;
        let names = block_on(async {
            let dbus = DBusProxy::new(conn).await?;
            Ok::<_, zbus::fdo::Error>(dbus.list_names().await?)
        })?;

        let mut players: Vec<String> = names
            .iter()
            .map(|n| n.as_str())
            .filter(|n| n.starts_with(BUS_PREFIX))
            .map(str::to_string)
            .collect();
        players.sort();
        Ok(players)
    }

    fn bind(&mut self, bus_name: &str) -> Result<(), SourceError> {
        let conn = self.conn.as_ref().ok_or(SourceError::Unbound)?;
        let destination = BusName::try_from(bus_name.to_string()).map_err(zbus::Error::from)?;
        let props = block_on(PropertiesProxy::new(conn, destination, OBJECT_PATH))?;
        debug!(player = bus_name, "bound MPRIS player");
        self.bound = Some(Bound {
            name: bus_name.to_string(),
            props,
        });
        Ok(())
    }

    fn release(&mut self) {
        if let Some(b) = self.bound.take() {
            debug!(player = %b.name, "released MPRIS player");
        }
    }

    fn status(&mut self) -> Result<PlayState, SourceError> {
        let value = self.get("PlaybackStatus")?;
        Ok(value_str(&value)
            .map(|s| play_state_from_status(&s))
            .unwrap_or(PlayState::Unknown))
    }

    fn position_us(&mut self) -> Result<i64, SourceError> {
        let value = self.get("Position")?;
        Ok(value_i64(&value).unwrap_or(0))
    }

    fn metadata(&mut self) -> Result<TrackMetadata, SourceError> {
        let value = self.get("Metadata")?;
        let map = HashMap::<String, OwnedValue>::try_from(value).map_err(zbus::Error::from)?;
        Ok(TrackMetadata::from_map(&map))
    }

    fn call(&mut self, method: &str) -> Result<(), SourceError> {
        let conn = self.conn.as_ref().ok_or(SourceError::Unbound)?;
        let name = self.bound()?.name.clone();
        block_on(conn.call_method(
            Some(name.as_str()),
            OBJECT_PATH,
            Some(PLAYER_IFACE),
            method,
            &(),
        ))?;
        Ok(())
    }

    fn volume(&mut self) -> Result<f64, SourceError> {
        let value = self.get("Volume")?;
        match &*value {
            Value::F64(v) => Ok(*v),
            _ => Ok(value_i64(&value).map(|v| v as f64).unwrap_or(0.0)),
        }
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), SourceError> {
        let bound = self.bound()?;
        block_on(bound.props.set(
            InterfaceName::from_static_str_unchecked(PLAYER_IFACE),
            "Volume",
            Value::F64(volume),
        ))?;
        Ok(())
    }
}

/// A player that left the bus answers through the bus daemon with
/// `ServiceUnknown` or `NameHasNoOwner`.
pub(crate) fn property_error(err: zbus::fdo::Error, player: &str) -> SourceError {
    match err {
        zbus::fdo::Error::ServiceUnknown(_) | zbus::fdo::Error::NameHasNoOwner(_) => {
            SourceError::Vanished(player.to_string())
        }
        other => SourceError::Fdo(other),
    }
}

pub(crate) fn value_str(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::ObjectPath(p) => Some(p.as_str().to_string()),
        Value::Value(inner) => value_str(inner),
        _ => None,
    }
}

pub(crate) fn value_strings(value: &Value<'_>) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_str).collect(),
        Value::Value(inner) => value_strings(inner),
        other => value_str(other).into_iter().collect(),
    }
}

pub(crate) fn value_i64(value: &Value<'_>) -> Option<i64> {
    match value {
        Value::I64(n) => Some(*n),
        Value::U64(n) => i64::try_from(*n).ok(),
        Value::I32(n) => Some(i64::from(*n)),
        Value::U32(n) => Some(i64::from(*n)),
        Value::I16(n) => Some(i64::from(*n)),
        Value::U16(n) => Some(i64::from(*n)),
        Value::U8(n) => Some(i64::from(*n)),
        Value::F64(n) => Some(*n as i64),
        Value::Value(inner) => value_i64(inner),
        _ => None,
    }
}
