use thiserror::Error;

/// The error type.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    //------------------------------
    // Parse-time errors (user error)
    //------------------------------
    /// A positional or named argument did not receive enough tokens.
    #[error("argument {name:?}: expected {wanted} token(s), got {got}")]
    ArityMismatch {
        /// Name of the argument that came up short.
        name: String,
        /// Number of tokens the argument consumes.
        wanted: usize,
        /// Number of tokens that were actually available.
        got: usize,
    },

    /// A value-taking flag was specified without a resolvable value.
    #[error("flag {name:?} missing value (use --{name}=VALUE)")]
    MissingFlagValue {
        /// Long name of the flag.
        name: String,
    },

    /// Unconsumed tokens remained once all parse phases finished.
    #[error("too many arguments: {0}")]
    TooManyArguments(usize),

    //------------------------------
    // Data-phase errors
    //------------------------------
    /// The input pattern could not be compiled.
    #[error("bad input pattern: {0}")]
    Pattern(String),

    /// An input file did not hold a usable pair of numeric rows.
    #[error("bad series: {0}")]
    Series(String),

    /// An I/O failure, carried as text so the error stays comparable.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Self {
        Error::Pattern(e.to_string())
    }
}

/// Convenience type that allows a function to be defined as returning a
/// [Result], but which only requires the success type to be specified,
/// defaulting the error type to this crates `Error` type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
