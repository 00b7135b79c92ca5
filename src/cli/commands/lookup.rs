//! `secretsync lookup` — read one field from one or more secrets.
//!
//! With a single id a fetch failure is an error.  With several ids,
//! secrets that can't be fetched are reported as warnings instead.

use crate::cli::output;
use crate::cli::{parse_ids, Cli, Context};
use crate::errors::Result;
use crate::lease::{lookup, lookup_one, FieldValue, LookupResult};

/// Execute the `lookup` command.
pub fn execute(cli: &Cli, field: &str, raw_ids: &[String]) -> Result<()> {
    let ids = parse_ids(raw_ids)?;
    let ctx = Context::load(cli)?;
    let store = ctx.open_store()?;

    let result = match ids.as_slice() {
        [id] => LookupResult {
            field: field.to_string(),
            values: vec![FieldValue {
                id: *id,
                value: lookup_one(&store, *id, field)?,
            }],
            warnings: Vec::new(),
        },
        _ => lookup(&store, &ids, field)?,
    };

    output::print_lookup(&result);
    Ok(())
}
