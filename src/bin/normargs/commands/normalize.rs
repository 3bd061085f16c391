//! `normargs normalize` command

use anyhow::Result;

use crate::cli::NormalizeArgs;
use crate::commands::fail;
use normargs::{normalize, GlobalContext, Value};

pub fn execute(args: NormalizeArgs, ctx: &GlobalContext, color: bool) -> Result<()> {
    let mut spec = normalize(args.name);

    if !args.legal.is_empty() {
        spec = spec.values(args.legal.iter().map(|v| Value::parse_scalar(v)));
    }
    if let Some(file) = &args.values_file {
        spec = spec.values_from_path(ctx.resolve_data_path(file))?;
    }
    if let Some(ty) = args.ty {
        spec = spec.of_type(ty);
    }
    if !args.alias.is_empty() {
        spec = spec.alias(
            args.alias
                .into_iter()
                .map(|(from, to)| (Value::parse_scalar(&from), to)),
        );
    }
    if args.multiple {
        spec = spec.multiple();
    }

    let normalizer = spec.build()?;
    tracing::debug!("normalizer {}", normalizer);

    let raw = match args.values.as_slice() {
        [single] => Value::parse_scalar(single),
        many => Value::List(many.iter().map(|v| Value::parse_scalar(v)).collect()),
    };

    match normalizer.apply(&raw) {
        Ok(value) => {
            println!("{}", value);
            Ok(())
        }
        Err(err) => fail(&err, ctx, None, color),
    }
}
