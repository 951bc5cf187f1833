//! Error types for the bundler pipeline.
//!
//! Structured error types using thiserror, split along the taxonomy in the
//! error handling design: configuration, resolution, parsing, and internal
//! invariant failures are fatal (`CriboError`); semantic and dynamism
//! findings are non-fatal and accumulate as [`Diagnostic`]s instead.

use crate::types::ModuleId;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-layer errors: missing entry file, inaccessible source root.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("entry file not found: {path}")]
    EntryNotFound { path: PathBuf },

    #[error("source root is not a directory: {path}")]
    SourceRootInaccessible { path: PathBuf },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    #[error("module '{module}' imports itself at top level; this can never terminate")]
    SelfImport { module: ModuleId },

    #[error("failed to read configuration file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Figment(#[from] figment::Error),
}

/// Module resolution errors (§4.2).
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error(
        "cannot resolve first-party import '{specifier}' from module '{from_module}': no matching file under any source root"
    )]
    Unresolvable {
        specifier: String,
        from_module: ModuleId,
    },

    #[error(
        "import '{specifier}' from module '{from_module}' is ambiguous across source roots {roots:?}"
    )]
    Ambiguous {
        specifier: String,
        from_module: ModuleId,
        roots: Vec<PathBuf>,
    },

    #[error("relative import '{specifier}' in '{from_module}' escapes the top-level package")]
    RelativeImportEscapesRoot {
        specifier: String,
        from_module: ModuleId,
    },
}

/// Parse-layer errors, surfaced from the parser facade with precise location.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("syntax error in '{path}' at line {line}, column {column}: {reason}")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
        reason: String,
    },

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },
}

/// Internal invariant violations (§3 a-e). These should never happen; seeing one is a bug.
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("module '{module}' is both inlined and wrapped, violating invariant (a)")]
    DoubleClassified { module: ModuleId },

    #[error("rename collision: emitted name '{name}' is bound by both {first} and {second}")]
    RenameCollision {
        name: String,
        first: ModuleId,
        second: ModuleId,
    },

    #[error("no emitted name planned for symbol '{symbol}' in module '{module}'")]
    MissingRenamePlan { module: ModuleId, symbol: String },

    #[error("internal invariant violated: {reason}")]
    Invariant { reason: String },
}

/// Non-fatal findings accumulated during semantic analysis and emission (§7).
/// These never abort the pipeline; `--strict` may promote them to a fatal run.
#[derive(Error, Debug, Clone)]
pub enum Diagnostic {
    #[error("stdlib module '{stdlib_module}' shadowed by first-party module of the same name; first-party wins")]
    StdlibShadowedByFirstParty { stdlib_module: String },

    #[error("'{module}' defines __all__ with a non-literal value; falling back to default visibility rules")]
    NonLiteralAll { module: ModuleId },

    #[error(
        "wildcard import 'from {module} import *' pulls in a side-effectful module with no __all__; including all default-visible names"
    )]
    WildcardFromSideEffectfulModule { module: ModuleId },

    #[error("'{module}' calls importlib.import_module with a non-literal argument at byte {offset}; left dynamic, not bundled")]
    DynamicImportNotBundled { module: ModuleId, offset: u32 },

    #[error("'{module}' calls exec/eval at module top level; module forced to wrapper mode, tree-shaking disabled for it")]
    UnsupportedTopLevelDynamism { module: ModuleId },

    #[error("'{module}' assigns to sys.modules; this is not supported and may produce an incorrect bundle")]
    SysModulesMonkeyPatch { module: ModuleId },
}

/// Top-level fatal error type. `main` maps this to a non-zero exit code.
#[derive(Error, Debug)]
pub enum CriboError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("{count} semantic warning(s) promoted to errors under --strict")]
    StrictModePromoted { count: usize },

    #[error("failed to write bundle to '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CriboError {
    /// Recovery suggestions surfaced alongside the error on stderr.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Config(ConfigError::EntryNotFound { .. }) => vec![
                "Check that the entry path is correct and relative to the current directory",
            ],
            Self::Resolution(ResolutionError::Unresolvable { .. }) => vec![
                "Add the missing package's directory to --source-root",
                "Check for a typo in the import statement",
            ],
            Self::Resolution(ResolutionError::Ambiguous { .. }) => vec![
                "Remove the duplicate module from one of the conflicting source roots",
            ],
            Self::Parse(ParseError::Syntax { .. }) => vec![
                "Run the file through the target Python interpreter to confirm it parses",
            ],
            Self::Emit(_) => vec![
                "This indicates an internal bug; please file an issue with the failing input",
            ],
            Self::StrictModePromoted { .. } => vec![
                "Re-run without --strict to see the bundle with warnings, or fix the listed modules",
            ],
            Self::WriteFailed { .. } => {
                vec!["Check write permissions and free disk space at the output path"]
            }
            Self::Config(ConfigError::SelfImport { .. }) => vec![
                "A module cannot import itself at module scope; move the import inside a function if it's intentional",
            ],
            Self::Config(_) => vec![],
        }
    }
}

pub type CriboResult<T> = Result<T, CriboError>;
