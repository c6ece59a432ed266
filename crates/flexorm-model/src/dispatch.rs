//! Convention-named operation dispatch.
//!
//! [`Record::call`] accepts names such as `getPostTitle`, `theVenue`,
//! `getPostDateFormatted` or `setEventType` and routes them to the generic
//! [`get_with`](Record::get_with), [`show_with`](Record::show_with) and
//! [`set`](Record::set) entry points.
//!
//! Arguments by action:
//!
//! | Operation | `args[0]` | `args[1]` |
//! |-----------|-----------|-----------|
//! | `get<Attr>` / `the<Attr>` | truthy: return all terms | |
//! | `get<Attr>Formatted` / `the<Attr>Formatted` | format string | truthy: all terms |
//! | `set<Attr>` | the value (required) | |
//!
//! A format string is never read as the all-terms flag. Formatted reads
//! return only the first term unless `args[1]` is truthy, even when
//! `args[0]` is a non-empty format.

use std::io::Write;

use flexorm_types::AttrValue;
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::naming::{parse_operation, Action};
use crate::record::{ReadOptions, Record};

impl Record {
    /// Run a convention-named operation.
    ///
    /// `get` returns the value; `the` writes it to `out` and `set` assigns
    /// it, both returning `None`.
    pub fn call(
        &mut self,
        operation: &str,
        args: &[AttrValue],
        out: &mut dyn Write,
    ) -> ModelResult<Option<AttrValue>> {
        let op = parse_operation(operation)?;
        debug!(
            operation,
            action = op.action.as_str(),
            attribute = %op.attribute,
            formatted = op.formatted,
            "dispatching"
        );

        match op.action {
            Action::Get => {
                let options = read_options(op.formatted, args);
                self.get_with(&op.attribute, &options).map(Some)
            }
            Action::The => {
                let options = read_options(op.formatted, args);
                self.show_with(&op.attribute, &options, out)?;
                Ok(None)
            }
            Action::Set => {
                let value = args
                    .first()
                    .cloned()
                    .ok_or_else(|| ModelError::MissingArgument {
                        operation: operation.to_string(),
                    })?;
                self.set(&op.attribute, value)?;
                Ok(None)
            }
        }
    }
}

fn read_options(formatted: bool, args: &[AttrValue]) -> ReadOptions {
    let truthy = |i: usize| args.get(i).is_some_and(AttrValue::is_truthy);
    if formatted {
        ReadOptions {
            all_terms: truthy(1),
            format: args.first().and_then(AttrValue::as_str).map(str::to_string),
        }
    } else {
        ReadOptions {
            all_terms: truthy(0),
            format: None,
        }
    }
}
