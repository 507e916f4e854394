use super::code::Label;
use super::AccessFlags;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A label minted by one method body was used in another
    ForeignLabel(Label),

    /// A local minted by one method body was used in another
    ForeignLocal(String),

    /// Labels can only be marked once
    LabelAlreadyMarked(Label),

    /// An instruction was emitted while no block was open
    ///
    /// This happens after unconditional jumps, returns, and throws. Mark a label to open a new
    /// block before emitting more code.
    NoCurrentLabel { instruction: String },

    MethodCodeNotFinished {
        pending_block: Option<Label>,
        unplaced_labels: Vec<Label>,
    },

    /// Operand types are incompatible with the operation
    TypeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    /// `void` can only be used as a return type
    VoidNotAllowed(&'static str),

    /// The type must be a class type (not a primitive or an array)
    NotAClassType(String),

    /// Static methods have no receiver
    NoThisInStaticMethod(String),

    ArgumentCountMismatch {
        method: String,
        expected: usize,
        found: usize,
    },

    ParameterOutOfBounds { index: usize, count: usize },

    /// More registers were needed than the format can address
    RegisterOverflow(usize),

    DuplicateType(String),
    DuplicateMethod(String),
    DuplicateField(String),

    /// A catch clause for this exception type is already active
    AlreadyCaught(String),

    /// There is no active catch clause for this exception type
    NoCatchClause(String),

    /// Only static fields can have an initial value
    InstanceFieldWithValue(String),

    /// Fields cannot be `synchronized`
    SynchronizedField(String),

    /// Static initializers must be declared `static`
    NonStaticInitializer(String),

    /// Abstract and native methods have no body to put instructions in
    BodilessMethodWithCode(String),

    /// Flags that are not allowed on the declaration
    InvalidAccessFlags {
        declaration: String,
        flags: AccessFlags,
    },

    /// Locals can only be created before the first instruction is emitted
    LocalAfterInstructions,

    LocalsAlreadyInitialized,
    LocalsNotInitialized,

    /// Members were declared on types which were never declared themselves
    UndeclaredTypes { members: Vec<String> },

    MalformedDescriptor(String),
    MalformedName(String),
}

/// Broad classification of errors
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// Misuse of the block graph (labels, locals, open blocks)
    Structural,

    /// Operands or constants of the wrong type
    Type,

    /// Indices out of range
    Bounds,

    /// Invalid or conflicting declarations
    Declaration,

    /// Operations called in the wrong order
    UsageOrder,

    /// Dangling references found when finalizing
    Reference,

    /// Bad descriptor or name strings
    Malformed,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ForeignLabel(_)
            | Error::ForeignLocal(_)
            | Error::LabelAlreadyMarked(_)
            | Error::NoCurrentLabel { .. }
            | Error::MethodCodeNotFinished { .. } => ErrorKind::Structural,

            Error::TypeMismatch { .. }
            | Error::VoidNotAllowed(_)
            | Error::NotAClassType(_)
            | Error::NoThisInStaticMethod(_)
            | Error::ArgumentCountMismatch { .. } => ErrorKind::Type,

            Error::ParameterOutOfBounds { .. } | Error::RegisterOverflow(_) => ErrorKind::Bounds,

            Error::DuplicateType(_)
            | Error::DuplicateMethod(_)
            | Error::DuplicateField(_)
            | Error::AlreadyCaught(_)
            | Error::NoCatchClause(_)
            | Error::InstanceFieldWithValue(_)
            | Error::SynchronizedField(_)
            | Error::NonStaticInitializer(_)
            | Error::BodilessMethodWithCode(_)
            | Error::InvalidAccessFlags { .. } => ErrorKind::Declaration,

            Error::LocalAfterInstructions
            | Error::LocalsAlreadyInitialized
            | Error::LocalsNotInitialized => ErrorKind::UsageOrder,

            Error::UndeclaredTypes { .. } => ErrorKind::Reference,

            Error::MalformedDescriptor(_) | Error::MalformedName(_) => ErrorKind::Malformed,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ForeignLabel(label) => write!(f, "{:?} belongs to another method", label),
            Error::ForeignLocal(local) => write!(f, "{} belongs to another method", local),
            Error::LabelAlreadyMarked(label) => write!(f, "{:?} already marked", label),
            Error::NoCurrentLabel { instruction } => {
                write!(f, "no open block for instruction {}", instruction)
            }
            Error::MethodCodeNotFinished {
                pending_block,
                unplaced_labels,
            } => write!(
                f,
                "method code not finished (pending block: {:?}, unplaced labels: {:?})",
                pending_block, unplaced_labels
            ),
            Error::TypeMismatch {
                context,
                expected,
                found,
            } => write!(f, "{}: expected {} but was {}", context, expected, found),
            Error::VoidNotAllowed(context) => write!(f, "{} cannot be void", context),
            Error::NotAClassType(typ) => write!(f, "{} is not a class type", typ),
            Error::NoThisInStaticMethod(method) => {
                write!(f, "static method {} has no 'this'", method)
            }
            Error::ArgumentCountMismatch {
                method,
                expected,
                found,
            } => write!(
                f,
                "{} expects {} arguments but got {}",
                method, expected, found
            ),
            Error::ParameterOutOfBounds { index, count } => write!(
                f,
                "parameter {} out of bounds (method has {} parameters)",
                index, count
            ),
            Error::RegisterOverflow(count) => write!(f, "{} registers is too many", count),
            Error::DuplicateType(typ) => write!(f, "already declared: {}", typ),
            Error::DuplicateMethod(method) => write!(f, "already declared: {}", method),
            Error::DuplicateField(field) => write!(f, "already declared: {}", field),
            Error::AlreadyCaught(typ) => write!(f, "already caught: {}", typ),
            Error::NoCatchClause(typ) => write!(f, "not caught: {}", typ),
            Error::InstanceFieldWithValue(field) => write!(
                f,
                "instance field {} cannot have an initial value (only static fields can)",
                field
            ),
            Error::SynchronizedField(field) => {
                write!(f, "field {} cannot be synchronized", field)
            }
            Error::NonStaticInitializer(method) => {
                write!(f, "static initializer {} must be static", method)
            }
            Error::BodilessMethodWithCode(method) => {
                write!(f, "abstract or native method {} cannot have code", method)
            }
            Error::InvalidAccessFlags { declaration, flags } => {
                write!(f, "flags {:?} are not allowed on {}", flags, declaration)
            }
            Error::LocalAfterInstructions => {
                write!(f, "cannot allocate locals after adding instructions")
            }
            Error::LocalsAlreadyInitialized => write!(f, "locals already initialized"),
            Error::LocalsNotInitialized => write!(f, "locals not initialized yet"),
            Error::UndeclaredTypes { members } => write!(
                f,
                "members defined on undeclared types: {}",
                members.join(", ")
            ),
            Error::MalformedDescriptor(msg) => write!(f, "malformed descriptor: {}", msg),
            Error::MalformedName(msg) => write!(f, "malformed name: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
