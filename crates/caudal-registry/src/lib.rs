//! Backend registry and stream opener.
//!
//! Resolving a stream name works in two stages, mirroring the configuration
//! surface:
//!
//! 1. A named definition under `[pcm.<name>]` wins. Its `type` is looked up
//!    under `[pcmtype.<type>]`, whose `open` symbol selects a factory from
//!    the registry. The registry is compiled in: symbol strings map to
//!    factory functions, preserving the name-to-factory contract of a
//!    dynamic loader without one.
//! 2. Otherwise the name is tried against the literal grammar:
//!    `hw:<card>,<dev>[,<subdev>]`, `plug:<card>,<dev>[,<subdev>]`,
//!    `shm:<socket>,<name>`, `file:<path>[,<format>]`, and `null`.
//!
//! Anything else fails with a not-found error and a diagnostic naming the
//! stream.
//!
//! The direct-hardware and shared-memory transports live outside this
//! workspace; [`BackendRegistry::register_hw`] and
//! [`BackendRegistry::register_shm`] are the slots a driver binding fills.
//!
//! # Example
//!
//! ```rust,no_run
//! use caudal_core::Direction;
//! use caudal_pcm::OpenMode;
//!
//! let pcm = caudal_registry::open("null", Direction::Playback, OpenMode::empty())?;
//! # Ok::<(), caudal_pcm::Error>(())
//! ```

use std::collections::HashMap;

use caudal_config::{Config, PcmDef, StreamFilter};
use caudal_core::Direction;
use caudal_pcm::{Error, FileFormat, FilePcm, NullPcm, OpenMode, Pcm, PlugPcm, Result};

/// A literal stream address parsed from an open name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAddr<'a> {
    /// Direct hardware: card, device, subdevice (-1 when unspecified).
    Hw {
        /// Card index.
        card: i32,
        /// Device index.
        dev: i32,
        /// Subdevice index, `-1` for any.
        subdev: i32,
    },
    /// Conversion wrapper over direct hardware.
    Plug {
        /// Card index.
        card: i32,
        /// Device index.
        dev: i32,
        /// Subdevice index, `-1` for any.
        subdev: i32,
    },
    /// Shared-memory client.
    Shm {
        /// Server socket path.
        socket: &'a str,
        /// Stream name on the server.
        name: &'a str,
    },
    /// File capture over a null slave.
    File {
        /// Capture file path.
        path: &'a str,
        /// On-disk encoding.
        format: FileFormat,
    },
    /// Discarding sink / silent source.
    Null,
}

fn parse_card_spec(spec: &str) -> Option<(i32, i32, i32)> {
    let mut fields = spec.split(',');
    let card = fields.next()?.parse().ok()?;
    let dev = fields.next()?.parse().ok()?;
    let subdev = match fields.next() {
        Some(s) => s.parse().ok()?,
        None => -1,
    };
    if fields.next().is_some() {
        return None;
    }
    Some((card, dev, subdev))
}

/// Parse a literal stream name. Names are case-sensitive; numeric fields are
/// decimal.
pub fn parse_literal(name: &str) -> Option<StreamAddr<'_>> {
    if name == "null" {
        return Some(StreamAddr::Null);
    }
    if let Some(spec) = name.strip_prefix("hw:") {
        let (card, dev, subdev) = parse_card_spec(spec)?;
        return Some(StreamAddr::Hw { card, dev, subdev });
    }
    if let Some(spec) = name.strip_prefix("plug:") {
        let (card, dev, subdev) = parse_card_spec(spec)?;
        return Some(StreamAddr::Plug { card, dev, subdev });
    }
    if let Some(spec) = name.strip_prefix("shm:") {
        let (socket, sname) = spec.split_once(',')?;
        if socket.is_empty() || sname.is_empty() {
            return None;
        }
        return Some(StreamAddr::Shm {
            socket,
            name: sname,
        });
    }
    if let Some(spec) = name.strip_prefix("file:") {
        if spec.is_empty() {
            return None;
        }
        // A trailing `,raw` / `,wav` selects the encoding; anything else is
        // part of the path.
        if let Some((path, fmt)) = spec.rsplit_once(',') {
            if let Some(format) = FileFormat::from_name(fmt) {
                if path.is_empty() {
                    return None;
                }
                return Some(StreamAddr::File { path, format });
            }
        }
        return Some(StreamAddr::File {
            path: spec,
            format: FileFormat::Raw,
        });
    }
    None
}

/// Factory for a configured type: receives the registry and tree so it can
/// open slave streams, the open name, and the definition's fields.
pub type OpenFunc =
    fn(&BackendRegistry, &Config, &str, &PcmDef, Direction, OpenMode) -> Result<Pcm>;

/// Factory for `hw:` literals, supplied by a driver binding.
pub type HwOpenFunc = fn(&str, i32, i32, i32, Direction, OpenMode) -> Result<Pcm>;

/// Factory for `shm:` literals, supplied by a transport binding.
pub type ShmOpenFunc = fn(&str, &str, &str, Direction, OpenMode) -> Result<Pcm>;

/// Compiled-in registry of backend factories.
///
/// Pass it to [`open_with`] as an explicit collaborator; [`open`] builds a
/// default one per call for convenience.
pub struct BackendRegistry {
    symbols: HashMap<&'static str, OpenFunc>,
    hw_open: Option<HwOpenFunc>,
    shm_open: Option<ShmOpenFunc>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BackendRegistry {
    /// An empty registry with no factories at all.
    pub fn new() -> BackendRegistry {
        BackendRegistry {
            symbols: HashMap::new(),
            hw_open: None,
            shm_open: None,
        }
    }

    /// A registry with the built-in factory symbols registered:
    /// `null_open`, `file_open`, and `plug_open`.
    pub fn with_defaults() -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        registry.register("null_open", null_open);
        registry.register("file_open", file_open);
        registry.register("plug_open", plug_open);
        registry
    }

    /// Register a factory under a symbol name. A later registration under
    /// the same symbol replaces the earlier one.
    pub fn register(&mut self, symbol: &'static str, func: OpenFunc) {
        self.symbols.insert(symbol, func);
    }

    /// Supply the direct-hardware factory for `hw:` and `plug:` literals.
    pub fn register_hw(&mut self, func: HwOpenFunc) {
        self.hw_open = Some(func);
    }

    /// Supply the shared-memory factory for `shm:` literals.
    pub fn register_shm(&mut self, func: ShmOpenFunc) {
        self.shm_open = Some(func);
    }

    fn resolve(&self, lib: Option<&str>, symbol: &str) -> Result<OpenFunc> {
        if let Some(lib) = lib {
            if lib != "builtin" {
                tracing::error!(lib, "cannot open shared library");
                return Err(Error::NoEntry(lib.to_owned()));
            }
        }
        match self.symbols.get(symbol) {
            Some(func) => Ok(*func),
            None => {
                tracing::error!(symbol, "symbol is not defined in the registry");
                Err(Error::NoEntry(symbol.to_owned()))
            }
        }
    }

    fn open_hw(
        &self,
        name: &str,
        card: i32,
        dev: i32,
        subdev: i32,
        direction: Direction,
        mode: OpenMode,
    ) -> Result<Pcm> {
        let Some(hw_open) = self.hw_open else {
            return Err(Error::NotSupported("no hardware backend registered"));
        };
        hw_open(name, card, dev, subdev, direction, mode)
    }
}

fn direction_matches(filter: StreamFilter, direction: Direction) -> bool {
    match filter {
        StreamFilter::Playback => direction == Direction::Playback,
        StreamFilter::Capture => direction == Direction::Capture,
    }
}

/// Open a named stream against an explicit registry and configuration tree.
pub fn open_with(
    registry: &BackendRegistry,
    config: &Config,
    name: &str,
    direction: Direction,
    mode: OpenMode,
) -> Result<Pcm> {
    if let Some(def) = config.pcm(name) {
        if let Some(filter) = def.stream {
            if !direction_matches(filter, direction) {
                return Err(Error::InvalidArgument(
                    "definition is restricted to the other direction",
                ));
            }
        }
        let Some(type_def) = config.pcm_type(&def.type_name) else {
            tracing::error!(pcm = name, type_name = %def.type_name, "unknown PCM type");
            return Err(Error::NoEntry(def.type_name.clone()));
        };
        let func = registry.resolve(type_def.lib.as_deref(), &type_def.open)?;
        return func(registry, config, name, def, direction, mode);
    }
    match parse_literal(name) {
        Some(StreamAddr::Hw { card, dev, subdev }) => {
            registry.open_hw(name, card, dev, subdev, direction, mode)
        }
        Some(StreamAddr::Plug { card, dev, subdev }) => {
            let slave = registry.open_hw(name, card, dev, subdev, direction, mode)?;
            PlugPcm::open(Some(name), slave)
        }
        Some(StreamAddr::Shm { socket, name: sname }) => {
            let Some(shm_open) = registry.shm_open else {
                return Err(Error::NotSupported("no shared-memory backend registered"));
            };
            shm_open(name, socket, sname, direction, mode)
        }
        Some(StreamAddr::File { path, format }) => {
            let slave = NullPcm::open(None, direction, mode)?;
            FilePcm::open(Some(name), path, format, slave)
        }
        Some(StreamAddr::Null) => NullPcm::open(Some(name), direction, mode),
        None => {
            tracing::error!(pcm = name, "unknown PCM");
            Err(Error::NoEntry(name.to_owned()))
        }
    }
}

/// Open a named stream with a default registry and an empty configuration
/// tree.
pub fn open(name: &str, direction: Direction, mode: OpenMode) -> Result<Pcm> {
    open_with(
        &BackendRegistry::with_defaults(),
        &Config::empty(),
        name,
        direction,
        mode,
    )
}

fn null_open(
    _registry: &BackendRegistry,
    _config: &Config,
    name: &str,
    _def: &PcmDef,
    direction: Direction,
    mode: OpenMode,
) -> Result<Pcm> {
    NullPcm::open(Some(name), direction, mode)
}

fn file_open(
    registry: &BackendRegistry,
    config: &Config,
    name: &str,
    def: &PcmDef,
    direction: Direction,
    mode: OpenMode,
) -> Result<Pcm> {
    let Some(path) = def.string_field("file") else {
        return Err(Error::InvalidArgument("file definition needs a file field"));
    };
    let format = match def.string_field("format") {
        Some(fmt) => FileFormat::from_name(fmt)
            .ok_or(Error::InvalidArgument("unknown file format"))?,
        None => FileFormat::Raw,
    };
    let slave = match def.string_field("slave") {
        Some(slave_name) => open_with(registry, config, slave_name, direction, mode)?,
        None => NullPcm::open(None, direction, mode)?,
    };
    FilePcm::open(Some(name), path, format, slave)
}

fn plug_open(
    registry: &BackendRegistry,
    config: &Config,
    name: &str,
    def: &PcmDef,
    direction: Direction,
    mode: OpenMode,
) -> Result<Pcm> {
    let Some(slave_name) = def.string_field("slave") else {
        return Err(Error::InvalidArgument("plug definition needs a slave field"));
    };
    let slave = open_with(registry, config, slave_name, direction, mode)?;
    PlugPcm::open(Some(name), slave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_grammar() {
        assert_eq!(
            parse_literal("hw:0,1"),
            Some(StreamAddr::Hw {
                card: 0,
                dev: 1,
                subdev: -1
            })
        );
        assert_eq!(
            parse_literal("hw:1,2,3"),
            Some(StreamAddr::Hw {
                card: 1,
                dev: 2,
                subdev: 3
            })
        );
        assert_eq!(
            parse_literal("plug:0,0"),
            Some(StreamAddr::Plug {
                card: 0,
                dev: 0,
                subdev: -1
            })
        );
        assert_eq!(
            parse_literal("shm:/tmp/server,main"),
            Some(StreamAddr::Shm {
                socket: "/tmp/server",
                name: "main"
            })
        );
        assert_eq!(
            parse_literal("file:/tmp/out.wav,wav"),
            Some(StreamAddr::File {
                path: "/tmp/out.wav",
                format: FileFormat::Wav
            })
        );
        assert_eq!(
            parse_literal("file:/tmp/out.bin"),
            Some(StreamAddr::File {
                path: "/tmp/out.bin",
                format: FileFormat::Raw
            })
        );
        assert_eq!(parse_literal("null"), Some(StreamAddr::Null));

        assert_eq!(parse_literal("hw:x,y"), None);
        assert_eq!(parse_literal("hw:0"), None);
        assert_eq!(parse_literal("hw:0,1,2,3"), None);
        assert_eq!(parse_literal("shm:lonely"), None);
        assert_eq!(parse_literal("file:"), None);
        assert_eq!(parse_literal("surround51"), None);
        assert_eq!(parse_literal("NULL"), None, "names are case-sensitive");
    }

    #[test]
    fn unknown_name_fails_with_no_entry() {
        let err = open("does-not-exist", Direction::Playback, OpenMode::empty());
        assert!(matches!(err, Err(Error::NoEntry(name)) if name == "does-not-exist"));
    }

    #[test]
    fn hw_literal_without_driver_binding_is_unsupported() {
        let err = open("hw:0,0", Direction::Playback, OpenMode::empty());
        assert!(matches!(err, Err(Error::NotSupported(_))));
    }
}
