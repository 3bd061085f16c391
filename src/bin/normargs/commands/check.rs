//! `normargs check` command
//!
//! Runs the given arguments through the pipeline a wrapped callable would
//! get from the file. Every key takes one value or a list, narrowed to the
//! values the table holds, before the availability guard runs.

use anyhow::Result;

use crate::cli::CheckArgs;
use crate::commands::fail;
use normargs::{normalize, Args, GlobalContext, Param, PipelineBuilder, Signature, Value};

pub fn execute(args: CheckArgs, ctx: &GlobalContext, color: bool) -> Result<()> {
    let path = ctx.resolve_data_path(&args.file);
    let table = ctx.load_availability(&args.file)?;

    let signature = Signature::new(
        table
            .keys()
            .iter()
            .map(|key| Param::optional(key.as_str(), Value::Null)),
    );

    let mut builder = PipelineBuilder::new(signature)?;
    for key in table.keys() {
        builder = builder.normalize(normalize(key.as_str()).multiple())?;
    }
    let pipeline = builder
        .availability_with(table, ctx.availability_options())?
        .build();

    let call = args
        .assignments
        .into_iter()
        .fold(Args::new(), |call, (key, value)| call.kwarg(key, value));

    match pipeline.call(call) {
        Ok(kwargs) => {
            for (key, value) in &kwargs {
                if !value.is_null() {
                    tracing::debug!("{} = {}", key, value);
                }
            }
            println!("ok");
            Ok(())
        }
        Err(err) => fail(&err, ctx, Some(&path), color),
    }
}
