use gls_core::entities::PriorSelection;
use gls_core::events::InputEvent;
use gls_core::policy::SortPass;

use crate::cli::{GlobalFlags, SchemaArgs, SchemaType};

/// Handle `gls schema`.
pub fn handle(args: &SchemaArgs, _flags: &GlobalFlags) -> anyhow::Result<()> {
    println!("{}", render(args.type_name)?);
    Ok(())
}

fn render(type_name: SchemaType) -> anyhow::Result<String> {
    let schema = match type_name {
        SchemaType::Event => schemars::schema_for!(InputEvent),
        SchemaType::Prior => schemars::schema_for!(PriorSelection),
        SchemaType::SortPass => schemars::schema_for!(SortPass),
    };
    Ok(serde_json::to_string_pretty(&schema)?)
}
