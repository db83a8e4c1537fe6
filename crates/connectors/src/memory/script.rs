use model::DataForm;
use std::fmt;

pub(crate) enum Request<'a> {
    Script(&'a str),
    Function { name: &'a str, args: &'a [DataForm] },
}

impl fmt::Display for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Script(script) => f.write_str(script),
            Request::Function { name, args } => {
                let kinds: Vec<&str> = args.iter().map(DataForm::kind).collect();
                write!(f, "{name}({})", kinds.join(", "))
            }
        }
    }
}

/// Storage key of a table: `db/table` for database tables, else the name.
pub(crate) fn storage_key(database: Option<&str>, table: &str) -> String {
    match database {
        Some(db) if !db.is_empty() => format!("{db}/{table}"),
        _ => table.to_string(),
    }
}

/// Resolves `t`, `"t"` or `loadTable("db", "t")` to a storage key.
pub(crate) fn table_key(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if let Some(args) = reference
        .strip_prefix("loadTable(")
        .and_then(|r| r.strip_suffix(')'))
    {
        let (db, table) = args.split_once(',')?;
        return Some(storage_key(Some(unquote(db)), unquote(table)));
    }

    let name = unquote(reference);
    (!name.is_empty()).then(|| name.to_string())
}

/// Splits a partial application `name{target}`.
pub(crate) fn split_partial(function: &str) -> Option<(&str, &str)> {
    let (name, rest) = function.split_once('{')?;
    let target = rest.trim_end().strip_suffix('}')?;
    Some((name.trim(), target))
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}
