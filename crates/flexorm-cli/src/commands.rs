use std::io::{self, Write};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use flexorm_model::naming::camel_case;
use flexorm_model::{InMemoryBackends, Model, ModelSchema, Record, StorageKind};
use flexorm_types::{AttrValue, RecordId, NATIVE_FIELDS};
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::fixture::Fixture;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, cli.format, &mut out)
}

pub fn execute(command: Command, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Call(args) => cmd_call(args, format, out),
        Command::Set(args) => cmd_set(args, format, out),
        Command::ShowSchema(args) => cmd_show_schema(args, format, out),
    }
}

/// A model bound to stores seeded from the fixture.
struct Session {
    fixture: Fixture,
    stores: InMemoryBackends,
    model: Model,
}

impl Session {
    fn open(args: &ModelArgs) -> anyhow::Result<Self> {
        if args.save && args.fixture.is_none() {
            bail!("--save requires --fixture");
        }
        let schema = ModelSchema::from_toml_file(&args.schema)
            .with_context(|| format!("loading schema {}", args.schema.display()))?;
        let fixture = match &args.fixture {
            Some(path) => Fixture::load(path)?,
            None => Fixture::default(),
        };
        let stores = fixture.seed()?;

        // Taxonomies the schema writes to must exist before terms can be assigned.
        for (name, descriptor) in schema.attributes() {
            if descriptor.kind == Some(StorageKind::Taxonomy) {
                if let Some(key) = schema.storage_key(name, descriptor) {
                    stores.taxonomy.register_taxonomy(&key)?;
                }
            }
        }

        debug!(model = schema.name(), "session opened");
        let model = Model::new(schema, stores.backends());
        Ok(Self {
            fixture,
            stores,
            model,
        })
    }

    fn record(&self, id: Option<u64>) -> anyhow::Result<Record> {
        match id {
            Some(raw) => {
                let id = RecordId::new(raw).ok_or_else(|| anyhow!("record id must be non-zero"))?;
                Ok(self.model.instance_by_id(id)?)
            }
            None => Ok(self.model.new_record()),
        }
    }

    fn finish(&self, args: &ModelArgs) -> anyhow::Result<()> {
        if let (true, Some(path)) = (args.save, &args.fixture) {
            self.fixture.capture(&self.stores)?.save(path)?;
            debug!(path = %path.display(), "fixture saved");
        }
        Ok(())
    }
}

fn cmd_call(args: CallArgs, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let session = Session::open(&args.model)?;
    let mut record = session.record(args.model.id)?;
    let call_args: Vec<AttrValue> = args.args.iter().map(|a| parse_value(a)).collect();

    let mut echoed = Vec::new();
    let result = record
        .call(&args.operation, &call_args, &mut echoed)
        .with_context(|| format!("running {}", args.operation))?;
    if !echoed.is_empty() {
        out.write_all(&echoed)?;
        writeln!(out)?;
    }
    if let Some(value) = result {
        print_value(out, format, &value)?;
    }

    if args.persist {
        let id = record.persist()?;
        match format {
            OutputFormat::Text => writeln!(out, "{} Persisted record {}", "✓".green().bold(), id)?,
            OutputFormat::Json => writeln!(out, "{}", json!({ "persisted": id.get() }))?,
        }
    }

    session.finish(&args.model)
}

fn cmd_set(args: SetArgs, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let assignments = args
        .assignments
        .iter()
        .map(|a| {
            a.split_once('=')
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| anyhow!("invalid assignment {a:?}; expected attribute=value"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let session = Session::open(&args.model)?;
    let mut record = session.record(args.model.id)?;
    for (name, raw) in &assignments {
        record
            .set(name, parse_value(raw))
            .with_context(|| format!("setting {name}"))?;
    }

    let created = record.id().is_none();
    let id = record.persist()?;

    match format {
        OutputFormat::Text => {
            let verb = if created { "Created" } else { "Updated" };
            writeln!(out, "{} {} record {}", "✓".green().bold(), verb, id.to_string().yellow())?;
            for (name, raw) in &assignments {
                writeln!(out, "  {} = {}", name.bold(), raw)?;
            }
        }
        OutputFormat::Json => {
            let names: Vec<&str> = assignments.iter().map(|(name, _)| *name).collect();
            writeln!(out, "{}", json!({ "id": id.get(), "created": created, "set": names }))?;
        }
    }

    session.finish(&args.model)
}

fn cmd_show_schema(args: ShowSchemaArgs, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let schema = ModelSchema::from_toml_file(&args.schema)
        .with_context(|| format!("loading schema {}", args.schema.display()))?;

    let rows: Vec<(String, &str, Option<String>)> = schema
        .attributes()
        .map(|(name, descriptor)| {
            let kind = descriptor.kind.map_or("untyped", |k| k.as_str());
            (name.to_string(), kind, schema.storage_key(name, descriptor))
        })
        .collect();

    match format {
        OutputFormat::Text => {
            writeln!(
                out,
                "Model {} (post type {})",
                schema.name().bold(),
                schema.post_type().cyan()
            )?;
            for (name, kind, key) in &rows {
                let key = key.as_deref().unwrap_or("-");
                writeln!(out, "  {:<20} {:<13} {}", name, kind, key.yellow())?;
            }
            if args.native {
                writeln!(out, "Native fields:")?;
                for field in NATIVE_FIELDS {
                    writeln!(out, "  {:<20} {}", camel_case(field), field.dimmed())?;
                }
            }
        }
        OutputFormat::Json => {
            let attributes: Vec<_> = rows
                .iter()
                .map(|(name, kind, key)| json!({ "name": name, "type": kind, "key": key }))
                .collect();
            let mut doc = json!({
                "name": schema.name(),
                "post_type": schema.post_type(),
                "attributes": attributes,
            });
            if args.native {
                doc["native"] = json!(NATIVE_FIELDS);
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        }
    }
    Ok(())
}

/// JSON literals become their value; anything else is taken as a string.
fn parse_value(raw: &str) -> AttrValue {
    serde_json::from_str(raw).unwrap_or_else(|_| AttrValue::Str(raw.to_string()))
}

fn print_value(out: &mut dyn Write, format: OutputFormat, value: &AttrValue) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(value)?)?,
        OutputFormat::Text => match value {
            AttrValue::Null => writeln!(out, "{}", "(unset)".dimmed())?,
            AttrValue::Str(s) => writeln!(out, "{s}")?,
            AttrValue::Term(term) => writeln!(out, "{} ({})", term.name, term.slug.dimmed())?,
            other => writeln!(out, "{}", serde_json::to_string(other)?)?,
        },
    }
    Ok(())
}
