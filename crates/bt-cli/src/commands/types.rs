//! Custom type management and schema display.

use std::io::Write;

use anyhow::{Context, Result, bail};
use bt_core::{BuiltinType, CustomInput, CustomTypes, FieldKind, NewCustomType, SchemaRegistry};
use bt_db::Database;

/// Lists built-in and custom types with their colors.
pub fn list<W: Write>(writer: &mut W, db: &mut Database) -> Result<()> {
    let types = CustomTypes::new(db);
    for name in types.all_type_names() {
        let origin = if BuiltinType::is_builtin(&name) {
            "built-in"
        } else {
            "custom"
        };
        writeln!(writer, "{name:<16}{:<10}{origin}", types.color_for(&name))?;
    }
    Ok(())
}

/// Registers a custom type.
pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    color: &str,
    track_duration: bool,
    track_volume: bool,
    inputs: Vec<CustomInput>,
) -> Result<()> {
    CustomTypes::new(db)
        .create_type(NewCustomType {
            name: name.to_string(),
            color: color.to_string(),
            track_duration,
            track_volume,
            custom_inputs: inputs,
        })
        .with_context(|| format!("failed to add type {name}"))?;
    writeln!(writer, "Added type {name}")?;
    Ok(())
}

/// Removes a custom type. Events already recorded under it are kept.
pub fn remove<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    if BuiltinType::is_builtin(name) {
        bail!("{name} is a built-in type and cannot be removed");
    }
    let mut types = CustomTypes::new(db);
    if !types.names().iter().any(|n| n == name) {
        writeln!(writer, "No custom type named {name}")?;
        return Ok(());
    }
    types
        .remove_type(name)
        .with_context(|| format!("failed to remove type {name}"))?;
    writeln!(writer, "Removed type {name}")?;
    Ok(())
}

/// Prints the resolved fields of `type_name`.
pub fn schema<W: Write>(writer: &mut W, db: &Database, type_name: &str) -> Result<()> {
    let fields = SchemaRegistry::new(db).resolve_schema(type_name);
    if fields.is_empty() {
        writeln!(writer, "{type_name} has no fields")?;
        return Ok(());
    }

    writeln!(writer, "{type_name}")?;
    for field in &fields {
        let mut kind = match &field.kind {
            FieldKind::Timestamp => "timestamp".to_string(),
            FieldKind::Numeric => "number".to_string(),
            FieldKind::RangedNumeric { min, max, step } => {
                format!("{min}..{max} step {step}")
            }
            FieldKind::Enumerated { options } => format!("one of {}", options.join(", ")),
        };
        if let Some(unit) = field.unit {
            kind = format!("{kind} ({unit})");
        }
        writeln!(writer, "{:<10}{:<20}{kind}", field.name, field.label)?;
    }
    Ok(())
}
