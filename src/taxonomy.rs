//! Two-level (source, code) classification of failed futures.
//!
//! The engine reports a failure as a single packed `u32`: the originating subsystem in the top
//! byte and a subsystem-scoped code in the low 24 bits. [`ErrorSource::from_raw`] and
//! [`ErrorCode::classify`] turn that into typed values; both are total, so any raw signal maps to
//! exactly one taxonomy entry.

use std::fmt;

use thiserror::Error;

/// Subsystem that produced an error. `None` is the success sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSource {
    None,
    Library,
    Server,
    Tls,
    Compression,
}

impl ErrorSource {
    /// Numeric source tag, as packed into the top byte of a raw code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            ErrorSource::None => 0,
            ErrorSource::Library => 1,
            ErrorSource::Server => 2,
            ErrorSource::Tls => 3,
            ErrorSource::Compression => 4,
        }
    }

    /// Read the source from a packed raw code.
    ///
    /// `None` is only returned for raw `0`. A zero source byte with a nonzero code, or a source
    /// byte this crate does not know, is attributed to the library.
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        if raw == 0 {
            return ErrorSource::None;
        }
        match raw >> 24 {
            2 => ErrorSource::Server,
            3 => ErrorSource::Tls,
            4 => ErrorSource::Compression,
            _ => ErrorSource::Library,
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorSource::None => "none",
            ErrorSource::Library => "library",
            ErrorSource::Server => "server",
            ErrorSource::Tls => "tls",
            ErrorSource::Compression => "compression",
        };
        f.write_str(name)
    }
}

macro_rules! code_space {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All codes in this space, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Code within the owning source's space.
            #[must_use]
            pub fn code(self) -> u32 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            #[must_use]
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $(c if c == $code => Some($name::$variant),)+
                    _ => None,
                }
            }

            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

code_space! {
    /// Codes raised inside the client engine itself.
    LibraryError {
        BadParams = 1,
        NoStreams = 2,
        UnableToInit = 3,
        MessageEncode = 4,
        HostResolution = 5,
        UnexpectedResponse = 6,
        RequestQueueFull = 7,
        NoAvailableIoThread = 8,
        WriteError = 9,
        NoHostsAvailable = 10,
        IndexOutOfBounds = 11,
        InvalidItemCount = 12,
        InvalidValueType = 13,
        RequestTimedOut = 14,
        UnableToSetKeyspace = 15,
        CallbackAlreadySet = 16,
        InvalidStatementType = 17,
        NameDoesNotExist = 18,
        UnableToDetermineProtocol = 19,
        NullValue = 20,
        NotImplemented = 21,
        UnableToConnect = 22,
        UnableToClose = 23,
    }
}

code_space! {
    /// Error codes returned by a database node.
    ServerError {
        ServerError = 0x0000,
        ProtocolError = 0x000A,
        BadCredentials = 0x0100,
        Unavailable = 0x1000,
        Overloaded = 0x1001,
        IsBootstrapping = 0x1002,
        TruncateError = 0x1003,
        WriteTimeout = 0x1100,
        ReadTimeout = 0x1200,
        SyntaxError = 0x2000,
        Unauthorized = 0x2100,
        InvalidQuery = 0x2200,
        ConfigError = 0x2300,
        AlreadyExists = 0x2400,
        Unprepared = 0x2500,
    }
}

code_space! {
    /// TLS negotiation failures.
    TlsError {
        InvalidCert = 1,
        InvalidPrivateKey = 2,
        NoPeerCert = 3,
        InvalidPeerCert = 4,
        IdentityMismatch = 5,
    }
}

/// A code scoped to its source. `Ok` is the only code paired with [`ErrorSource::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    Library(LibraryError),
    Server(ServerError),
    Tls(TlsError),
}

impl ErrorCode {
    /// Map a raw packed code onto the taxonomy.
    ///
    /// Raw `0` is `Ok`. Anything the taxonomy cannot name, including every compression-source
    /// code, becomes `Library(UnexpectedResponse)` instead of being dropped.
    #[must_use]
    pub fn classify(raw: u32) -> Self {
        let code = raw & 0x00FF_FFFF;
        let named = match ErrorSource::from_raw(raw) {
            ErrorSource::None => return ErrorCode::Ok,
            // A zero source byte with a nonzero code is not a library code.
            ErrorSource::Library if raw >> 24 == 1 => {
                LibraryError::from_code(code).map(ErrorCode::Library)
            }
            ErrorSource::Server => ServerError::from_code(code).map(ErrorCode::Server),
            ErrorSource::Tls => TlsError::from_code(code).map(ErrorCode::Tls),
            ErrorSource::Library | ErrorSource::Compression => None,
        };
        named.unwrap_or(ErrorCode::Library(LibraryError::UnexpectedResponse))
    }

    /// Source that owns this code's space.
    #[must_use]
    pub fn source(self) -> ErrorSource {
        match self {
            ErrorCode::Ok => ErrorSource::None,
            ErrorCode::Library(_) => ErrorSource::Library,
            ErrorCode::Server(_) => ErrorSource::Server,
            ErrorCode::Tls(_) => ErrorSource::Tls,
        }
    }

    /// Pack back into the engine's raw representation.
    #[must_use]
    pub fn to_raw(self) -> u32 {
        let code = match self {
            ErrorCode::Ok => return 0,
            ErrorCode::Library(c) => c.code(),
            ErrorCode::Server(c) => c.code(),
            ErrorCode::Tls(c) => c.code(),
        };
        (self.source().code() << 24) | code
    }

    #[must_use]
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Ok => f.write_str("Ok"),
            ErrorCode::Library(c) => f.write_str(c.name()),
            ErrorCode::Server(c) => f.write_str(c.name()),
            ErrorCode::Tls(c) => f.write_str(c.name()),
        }
    }
}

/// A classified asynchronous failure reported through a future.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_source} error {code}: {message}")]
pub struct DriverError {
    error_source: ErrorSource,
    code: ErrorCode,
    message: String,
}

impl DriverError {
    /// Classify a raw failure signal from the engine.
    ///
    /// A failure always has a non-`None` source and a non-`Ok` code, even when the engine
    /// reports raw `0`.
    #[must_use]
    pub fn from_raw(raw: u32, message: impl Into<String>) -> Self {
        let source = ErrorSource::from_raw(raw);
        let code = ErrorCode::classify(raw);
        if source == ErrorSource::None || code.is_ok() {
            return DriverError::new(ErrorCode::Library(LibraryError::UnexpectedResponse), message);
        }
        DriverError {
            error_source: source,
            code,
            message: message.into(),
        }
    }

    /// Build an error from an already-typed code. `ErrorCode::Ok` is not a failure and is
    /// replaced by `Library(UnexpectedResponse)`.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let code = if code.is_ok() {
            ErrorCode::Library(LibraryError::UnexpectedResponse)
        } else {
            code
        };
        DriverError {
            error_source: code.source(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error_source(&self) -> ErrorSource {
        self.error_source
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the request timed out, either in the engine or on a replica.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Library(LibraryError::RequestTimedOut)
                | ErrorCode::Server(ServerError::ReadTimeout | ServerError::WriteTimeout)
        )
    }

    /// Whether the cluster could not serve the request at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Library(LibraryError::NoHostsAvailable | LibraryError::UnableToConnect)
                | ErrorCode::Server(
                    ServerError::Unavailable
                        | ServerError::Overloaded
                        | ServerError::IsBootstrapping
                )
        )
    }
}
