//! Coerced option/argument values and the provenance tag attached to each.

/// A coerced value stored against an option or positional argument attribute.
///
/// Generalizes the teacher's `option_parser::Value` (`Str`/`Int`/`Float`/`Bool`)
/// with a `List` variant for variadic options/arguments, since spec.md §3
/// requires a variadic's final value to be "an ordered list of coerced
/// inputs in the order tokens appeared."
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Appends `item` to this value if it is already a list, or starts a new
    /// single-element list otherwise. Used by the resolver's variadic
    /// accumulation rule (spec.md §4.4).
    pub fn push_variadic(self, item: Value) -> Value {
        match self {
            Value::List(mut items) => {
                items.push(item);
                Value::List(items)
            }
            other => Value::List(vec![other, item]),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Where a stored value currently came from. Closed set per spec.md §3.
///
/// Precedence, high to low: `Cli > Env > Implied > Config > Default`. The
/// resolver (`parser::resolver`) only enforces this ordering when
/// *overwriting* an existing value, never retroactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    Default,
    Config,
    Env,
    Cli,
    Implied,
}

impl ValueSource {
    /// Numeric rank used only to decide whether a new source is allowed to
    /// overwrite the current one; never used to order unrelated sources
    /// against each other.
    fn rank(self) -> u8 {
        match self {
            ValueSource::Default => 0,
            ValueSource::Config => 1,
            ValueSource::Implied => 2,
            ValueSource::Env => 3,
            ValueSource::Cli => 4,
        }
    }

    /// True if a value currently sourced from `self` may be overwritten by a
    /// value arriving from `incoming`.
    pub fn may_be_overwritten_by(self, incoming: ValueSource) -> bool {
        incoming.rank() >= self.rank()
    }
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueSource::Default => "default",
            ValueSource::Config => "config",
            ValueSource::Env => "env",
            ValueSource::Cli => "cli",
            ValueSource::Implied => "implied",
        };
        write!(f, "{s}")
    }
}
